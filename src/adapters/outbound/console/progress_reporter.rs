use crate::ports::outbound::{ProgressEvent, ProgressStream};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// StderrProgressReporter adapter for rendering progress events on stderr
///
/// Events with a position drive an indicatif bar; plain messages are printed
/// above it, so stdout stays free for document output.
pub struct StderrProgressReporter {
    progress_bar: Option<ProgressBar>,
    hidden: bool,
}

impl StderrProgressReporter {
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            hidden: false,
        }
    }

    /// A reporter that renders nothing
    pub fn hidden() -> Self {
        Self {
            progress_bar: None,
            hidden: true,
        }
    }

    fn bar_for(&mut self, total: usize) -> &ProgressBar {
        let hidden = self.hidden;
        let pb = self.progress_bar.get_or_insert_with(|| {
            let target = if hidden {
                ProgressDrawTarget::hidden()
            } else {
                ProgressDrawTarget::stderr()
            };
            let pb = ProgressBar::with_draw_target(Some(total as u64), target);
            if let Ok(style) = ProgressStyle::default_bar().template(
                "   {spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) - {msg}",
            ) {
                pb.set_style(style.progress_chars("=>-"));
            }
            pb
        });
        pb.set_length(total as u64);
        pb
    }

    /// Renders one event
    pub fn handle(&mut self, event: &ProgressEvent) {
        match (event.current, event.total) {
            (Some(current), Some(total)) => {
                let pb = self.bar_for(total);
                pb.set_position(current as u64);
                pb.set_message(event.message.clone());
            }
            _ => match &self.progress_bar {
                Some(pb) => pb.println(&event.message),
                None if !self.hidden => eprintln!("{}", event.message),
                None => {}
            },
        }
    }

    /// Clears the bar once the stream has ended
    pub fn finish(&mut self) {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_and_clear();
        }
    }

    /// Drains the stream until the engine drops its sink; returns the event count
    pub async fn drain(mut self, mut stream: ProgressStream) -> usize {
        let mut count = 0;
        while let Some(event) = stream.next().await {
            self.handle(&event);
            count += 1;
        }
        self.finish();
        count
    }
}

impl Default for StderrProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
