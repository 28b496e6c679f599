//! Success message constants used throughout the application.

pub const MSG_LOGGED_OUT: &str = "Logged out successfully";
pub const MSG_SERVER_RUNNING: &str = "Server is running";
pub const MSG_DESCRIPTION_OPENAI: &str = "Regenerated images based on feedback.";

pub fn msg_images_extracted(images: usize, files: usize) -> String {
    format!(
        "Successfully extracted {} images from {} PDF(s)",
        images, files
    )
}

pub fn msg_images_regenerated(count: usize) -> String {
    format!("Successfully regenerated {} image(s)", count)
}
