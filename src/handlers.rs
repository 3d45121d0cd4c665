pub mod agents;
pub mod dashboard;
pub mod general;
pub mod screenshots;
pub mod share;
pub mod swarms;
pub mod transcripts;

pub use agents::{agent_detail, send_chat};
pub use batch_tests::{
    batch_status, create_draft, launch, new_test_form, select_personas, terminate, test_detail,
    toggle_persona,
};
pub use dashboard::{dashboard, notifications};
pub use general::{health_check, serve_css, serve_favicon, serve_js};
pub use screenshots::{
    rerun_screenshot_test, screenshot_detail, screenshot_status, screenshot_tests,
};
pub use share::{share_batch, share_screenshot};
pub use swarms::{
    delete_swarm, edit_swarm_form, generate_swarm_personas, new_swarm_form, run_swarm, save_swarm,
    swarms_list, update_swarm,
};
pub use transcripts::session_transcript;
