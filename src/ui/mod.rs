pub mod controls;
pub mod main_window;
pub mod stream_dialog;

pub use main_window::MainWindow;
