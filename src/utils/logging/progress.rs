//! Progress bars for per-year file loading and variant runs

use indicatif::{ProgressBar, ProgressStyle};

/// Template shared by every bar: elapsed time, bar, position and current item
const BAR_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}";

/// A bar over `length` units, labelled with `description` until the first message
#[must_use]
pub fn create_main_progress_bar(length: u64, description: Option<&str>) -> ProgressBar {
    let style = ProgressStyle::with_template(BAR_TEMPLATE)
        .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars("=> "));
    let pb = ProgressBar::new(length).with_style(style);
    if let Some(label) = description {
        pb.set_message(label.to_string());
    }
    pb
}

/// Finish `pb`, leaving `message` in place of the last item label
pub fn finish_progress_bar(pb: &ProgressBar, message: Option<&str>) {
    match message {
        Some(message) => pb.finish_with_message(message.to_string()),
        None => pb.finish(),
    }
}
