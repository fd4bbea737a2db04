#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(feature = "progress"), allow(dead_code))]
pub enum ProgressOption {
    On,
    Off,
    /// Enable if stderr is a terminal
    Auto,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ArgProgress {
    /// Display listing progress
    #[cfg(feature = "progress")]
    #[clap(long, short='p', value_enum, default_value="auto")]
    progress: ProgressOption,
}

#[cfg(test)]
impl ArgProgress {
    pub fn off() -> ArgProgress {
        ArgProgress {
            #[cfg(feature = "progress")]
            progress: ProgressOption::Off,
        }
    }
}

#[derive(Debug)]
#[cfg_attr(not(feature = "progress"), allow(dead_code))]
pub enum Update {
    State(&'static str),
    Listed { pages: usize, objects: usize },
    Finished(),
    Error(String),
}

fn stderr_println(prefix: &impl std::fmt::Display, args: std::fmt::Arguments) {
    eprintln!("{prefix}{args}");
}

#[cfg(feature = "progress")]
mod progress_enabled {
    use std::sync::Arc;
    use super::*;
    pub type ProgressFn = Arc<dyn Fn(Update) + Send + Sync + 'static>;

    pub const PREFIX_ERROR: console::Emoji = console::Emoji("❌ ", "");
    pub const PREFIX_DONE: console::Emoji = console::Emoji("✅ ", "");

    pub struct Output {
        enabled: bool,
        multi: indicatif::MultiProgress,
    }
    impl Output {
        pub fn new(args: &ArgProgress) -> Output {
            let draw_target = indicatif::ProgressDrawTarget::stderr_with_hz(6);
            let enabled = match args.progress {
                ProgressOption::On => true,
                ProgressOption::Off => false,
                ProgressOption::Auto => console::user_attended_stderr(),
            };
            Output {
                enabled: enabled && !draw_target.is_hidden(),
                multi: indicatif::MultiProgress::with_draw_target(draw_target),
            }
        }
        pub fn add(&self, initial_state: impl Into<String>, name: String) -> ProgressFn {
            if !self.enabled {
                return Arc::new(|_update: Update| {});
            }

            let bar = indicatif::ProgressBar::new_spinner()
                .with_message(initial_state.into())
                .with_prefix(name);
            bar.set_style(indicatif::ProgressStyle::with_template("{spinner:.red} {prefix:.dim} {msg:.bold} {elapsed:>4}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner()));
            let bar = self.multi.add(bar);
            bar.enable_steady_tick(std::time::Duration::from_millis(150));

            Arc::new(move |update: Update| {
                match update {
                    Update::State(state_name) => bar.set_message(state_name),
                    Update::Listed { pages, objects } => bar.set_message(format!("{objects} objects in {pages} pages")),
                    Update::Finished() => bar.finish_and_clear(),
                    Update::Error(err) => bar.abandon_with_message(format!("{PREFIX_ERROR}failed: {err}")),
                }
            })
        }
        pub fn println(&self, prefix: &impl std::fmt::Display, args: std::fmt::Arguments) {
            if !self.enabled || self.multi.println(format!("{prefix}{args}")).is_err() {
                stderr_println(prefix, args);
            }
        }
        pub fn println_error(&self, args: std::fmt::Arguments) {
            self.println(&PREFIX_ERROR, args);
        }
        pub fn println_done(&self, args: std::fmt::Arguments) {
            self.println(&PREFIX_DONE, args);
        }
    }
}

#[cfg(feature = "progress")]
pub use progress_enabled::*;

#[cfg(not(feature = "progress"))]
mod progress_disabled {
    use super::*;
    pub fn empty_progress_fn(_update: Update) { }
    pub type ProgressFn = fn(Update);

    pub const PREFIX_ERROR: &'static str = "❌ ";
    pub const PREFIX_DONE: &'static str = "✅ ";

    #[derive(Default)]
    pub struct Output {
    }
    impl Output {
        pub fn new(_args: &ArgProgress) -> Output {
            Output { }
        }
        pub fn add(&self, _initial_state: impl Into<String>, _name: String) -> ProgressFn {
            empty_progress_fn
        }
        pub fn println_error(&self, args: std::fmt::Arguments) {
            stderr_println(&PREFIX_ERROR, args);
        }
        pub fn println_done(&self, args: std::fmt::Arguments) {
            stderr_println(&PREFIX_DONE, args);
        }
    }
}

#[cfg(not(feature = "progress"))]
pub use progress_disabled::*;

#[cfg(feature = "progress")]
#[test]
fn test_disabled_output_ignores_updates() {
    let output = Output::new(&ArgProgress::off());
    let update_fn = output.add("listing", "s3://bucket/".to_owned());
    update_fn(Update::Listed { pages: 1, objects: 10 });
    update_fn(Update::Finished());
}
