pub mod command;
pub mod filter;

pub use command::{
    build_capture_command, build_probe_command, build_trim_command, EncoderCommand,
    DURATION_PAD_SECS,
};
pub use filter::{build_graph, final_label, render_graph, FilterStage, MERGED_LABEL};
