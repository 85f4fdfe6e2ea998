/// Progress bar for dataset generation, safe to advance from rayon workers
pub (super) struct Progress {
    bar: ProgressBar,
    timer: Timer,
}

impl Progress {

    pub (super) fn new(n_samples: usize) -> Self {
        let bar = ProgressBar::new(n_samples as u64);
        bar.set_style(ProgressStyle::default_bar()
                      .template("Generating phantoms\n[{elapsed_precise}] {wide_bar} {pos}/{len} ({eta_precise})")
                      .unwrap_or_else(|_| ProgressStyle::default_bar())
        );
        bar.tick();
        let mut timer = Timer::new();
        timer.start(&format!("generating {} phantoms", group_digits(n_samples)));
        Self { bar, timer }
    }

    /// Callback for `Generator::generate_par`
    pub (super) fn sample_done(&self) -> impl Fn(usize) + Sync + '_ {
        move |_: usize| self.bar.inc(1)
    }

    pub (super) fn final_report(mut self, report: &DatasetReport) {
        let DatasetReport { requested, generated, skipped } = report;
        self.bar.finish_with_message("done");
        self.timer.done_with_message(&format!("generated {} / {} phantoms", group_digits(generated.len()), group_digits(requested)));
        for (i, e) in skipped {
            println!("Skipped sample {i}: {e}");
        }
    }
}

// ----- Imports -----------------------------------------------------------------------------------------
use indicatif::{ProgressBar, ProgressStyle};
use sparsect::{
    dataset::DatasetReport,
    utils::{group_digits, timing::Progress as Timer},
};
