//! Renders pipeline events: a spinner between batches, a bar while a batch
//! downloads, one line per committed batch.

use harvest_lib::HarvestEvent;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

pub(crate) struct RunDisplay {
    quiet: bool,
    bar: ProgressBar,
}

impl RunDisplay {
    pub(crate) fn new(quiet: bool) -> Self {
        Self {
            quiet,
            bar: crate::commands::spinner(quiet, "Starting..."),
        }
    }

    fn spin(&mut self, msg: String) {
        self.bar.finish_and_clear();
        self.bar = crate::commands::spinner(self.quiet, msg);
    }

    fn start_bar(&mut self, len: usize, msg: String) {
        self.bar.finish_and_clear();
        self.bar = if self.quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(len as u64);
            pb.set_style(
                ProgressStyle::with_template("  {bar:30.cyan/blue} {pos}/{len} {msg}")
                    .expect("static pattern")
                    .progress_chars("=> "),
            );
            pb.set_message(msg);
            pb
        };
    }

    /// Print a line without tearing the active bar.
    fn line(&self, f: impl FnOnce()) {
        self.bar.suspend(f);
    }

    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub(crate) fn handle(&mut self, event: HarvestEvent) {
        match event {
            HarvestEvent::CheckpointLoaded { offset, delivered } => self.line(|| {
                log::info!(
                    "{} Resuming at offset {} ({} images delivered)",
                    "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                    offset,
                    delivered,
                );
            }),
            HarvestEvent::Recovering { targets } => {
                self.spin(format!("No checkpoint; listing {} storage targets...", targets));
            }
            HarvestEvent::TargetScanned { target, files } => {
                self.bar.set_message(format!("Listed {} ({} images)", target, files));
            }
            HarvestEvent::Recovered { delivered } => self.line(|| {
                log::info!(
                    "{} Recovered {} delivered images from storage",
                    "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                    delivered,
                );
            }),
            HarvestEvent::StaleStageCleared { files } => self.line(|| {
                log::warn!(
                    "{} Removed {} leftover staged files from an interrupted run",
                    "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
                    files,
                );
            }),
            HarvestEvent::PageRequested { offset } => {
                self.spin(format!("Requesting catalog page at offset {}...", offset));
            }
            HarvestEvent::PageFetched {
                offset,
                entries,
                pending,
                already_delivered,
                abandoned,
            } => self.line(|| {
                log::info!(
                    "{} {} entries, {} images to fetch {}",
                    format!("[offset {}]", offset).if_supports_color(Stdout, |t| t.bold()),
                    entries,
                    pending,
                    format!("({} delivered, {} abandoned)", already_delivered, abandoned)
                        .if_supports_color(Stdout, |t| t.dimmed()),
                );
            }),
            HarvestEvent::BatchStarted {
                batch,
                total_batches,
                items,
            } => self.start_bar(items, format!("batch {}/{}", batch, total_batches)),
            HarvestEvent::ItemFinished { .. } => self.bar.inc(1),
            HarvestEvent::ItemFailed { id, reason } => {
                log::debug!("Image {} failed: {}", id, reason);
            }
            HarvestEvent::BatchRouted { batch, target } => {
                self.spin(format!("Transferring batch {} to {}...", batch, target));
            }
            HarvestEvent::BatchCommitted {
                batch,
                target,
                delivered,
                failed,
            } => {
                let target = target.unwrap_or_else(|| "-".to_string());
                self.line(|| {
                    log::info!(
                        "  {} batch {}: {} delivered to {}",
                        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                        batch,
                        delivered,
                        target.if_supports_color(Stdout, |t| t.cyan()),
                    );
                    if failed > 0 {
                        log::warn!(
                            "  {} batch {}: {} images failed, will retry next run",
                            "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
                            batch,
                            failed,
                        );
                    }
                });
            }
            HarvestEvent::PageCompleted {
                next_offset,
                entries_total,
                delivered_total,
            } => {
                self.bar.finish_and_clear();
                log::debug!(
                    "Page done: next offset {}, {} entries, {} delivered",
                    next_offset,
                    entries_total,
                    delivered_total
                );
            }
            HarvestEvent::Done { entries } => {
                self.bar.finish_and_clear();
                log::info!(
                    "{} Catalog exhausted, {} entries written",
                    "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                    entries,
                );
            }
        }
    }
}
