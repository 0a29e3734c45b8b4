use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use fieldops_core::Event;
use fieldops_core::filter::EventFilter;
use fieldops_core::timeline::DayTimeline;
use fieldops_provider_espocrm::{Aggregator, FetchResult};
use owo_colors::OwoColorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::report_failures;
use super::timeline::{default_width, print_legend, print_timeline};
use crate::context::Context;
use crate::filters::FilterArgs;
use crate::navigator::{Debounce, LatestOnly, NavCommand, Navigator};

const HELP: &str = concat!(
    "n: next day  p: previous day  t: today  YYYY-MM-DD: jump  ",
    "h CATEGORY: show/hide  r: retry  q: quit"
);

/// A finished fetch, tagged with the generation that requested it
struct Loaded {
    generation: u64,
    date: NaiveDate,
    result: FetchResult,
}

/// What the loop does after one line of input
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Quit,
    Help,
    /// Date changed; a fetch is scheduled after the debounce delay
    Moved(NaiveDate),
    /// Filter changed; draw the shown response again
    Redraw,
    /// Fetch scheduled without delay
    Retry,
    Unchanged,
}

/// Everything the watch loop decides, without the terminal and the network
struct WatchState {
    navigator: Navigator,
    debounce: Debounce,
    filter: EventFilter,
    generations: LatestOnly,
    /// Last applied response, kept so category toggles re-render without a fetch
    shown: Option<Loaded>,
}

impl WatchState {
    fn new(navigator: Navigator, debounce: Debounce, filter: EventFilter) -> Self {
        WatchState {
            navigator,
            debounce,
            filter,
            generations: LatestOnly::default(),
            shown: None,
        }
    }

    fn on_line(&mut self, line: &str, today: NaiveDate, now: Instant) -> Step {
        let Some(command) = NavCommand::parse(line, today) else {
            return Step::Help;
        };

        match command {
            NavCommand::Quit => Step::Quit,
            NavCommand::Retry => {
                self.debounce.trigger_now(now);
                Step::Retry
            }
            NavCommand::Toggle(category) => {
                let visible = self.filter.toggle(category);
                tracing::debug!(%category, visible, "toggled category");
                Step::Redraw
            }
            nav => {
                if self.navigator.apply(&nav) {
                    self.debounce.trigger(now);
                    Step::Moved(self.navigator.date())
                } else {
                    Step::Unchanged
                }
            }
        }
    }

    /// Clear the timer and number a fetch of the shown date
    fn begin_fetch(&mut self) -> (u64, NaiveDate) {
        self.debounce.take();
        let generation = self.generations.next();
        let date = self.navigator.date();
        tracing::debug!(generation, %date, "fetching");
        (generation, date)
    }

    /// Keep `loaded` if no newer fetch was started. Returns true when kept.
    fn on_loaded(&mut self, loaded: Loaded) -> bool {
        if !self.generations.is_current(loaded.generation) {
            tracing::debug!(
                generation = loaded.generation,
                date = %loaded.date,
                "discarding superseded response"
            );
            return false;
        }
        self.shown = Some(loaded);
        true
    }
}

pub async fn run(ctx: Context, date: NaiveDate, args: &FilterArgs) -> Result<()> {
    let aggregator = Arc::new(ctx.aggregator()?);
    let mut state = WatchState::new(
        Navigator::new(date, ctx.today),
        Debounce::new(ctx.config.debounce()?),
        args.to_filter(&ctx.prefs),
    );

    let (input_tx, mut input_rx) = mpsc::channel::<String>(16);
    let (loaded_tx, mut loaded_rx) = mpsc::channel::<Loaded>(8);
    tokio::spawn(read_input(input_tx));

    println!("{}", HELP.dimmed());
    state.debounce.trigger_now(Instant::now());

    loop {
        tokio::select! {
            _ = wait_for(state.debounce.deadline()) => {
                let (generation, date) = state.begin_fetch();
                start_fetch(&aggregator, generation, date, loaded_tx.clone());
            }
            loaded = loaded_rx.recv() => {
                let Some(loaded) = loaded else { break };
                if state.on_loaded(loaded) {
                    if let Some(shown) = &state.shown {
                        draw(&ctx, shown, &state.filter);
                    }
                }
            }
            line = input_rx.recv() => {
                let Some(line) = line else { break };
                match state.on_line(&line, ctx.today, Instant::now()) {
                    Step::Quit => break,
                    Step::Help => println!("{}", HELP.dimmed()),
                    Step::Moved(date) => println!("{}", format!("→ {date}").dimmed()),
                    Step::Redraw => {
                        if let Some(shown) = &state.shown {
                            draw(&ctx, shown, &state.filter);
                        }
                    }
                    Step::Retry | Step::Unchanged => {}
                }
            }
        }
    }

    Ok(())
}

/// Sleep until `deadline`; never completes without one
async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn start_fetch(
    aggregator: &Arc<Aggregator>,
    generation: u64,
    date: NaiveDate,
    tx: mpsc::Sender<Loaded>,
) {
    let aggregator = Arc::clone(aggregator);

    tokio::spawn(async move {
        let result = aggregator.fetch_day(date).await;
        // The receiver is gone once the view has quit
        let _ = tx
            .send(Loaded {
                generation,
                date,
                result,
            })
            .await;
    });
}

fn draw(ctx: &Context, loaded: &Loaded, filter: &EventFilter) {
    let visible: Vec<Event> = filter
        .apply(&loaded.result.events)
        .into_iter()
        .cloned()
        .collect();
    let window = ctx.config.window();
    let timeline =
        DayTimeline::build(&visible, loaded.date, ctx.tz, window, ctx.config.lane_cap);

    println!();
    report_failures(&loaded.result);
    if loaded.result.is_partial() {
        eprintln!("{}", "r: retry".dimmed());
    }
    print_timeline(&timeline, default_width(window), ctx.today);
    print_legend(&loaded.result, filter);
}

async fn read_input(tx: mpsc::Sender<String>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "could not read input");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use fieldops_core::Category;

    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn state() -> WatchState {
        WatchState::new(
            Navigator::new(d(20), d(20)),
            Debounce::new(DELAY),
            EventFilter::new(),
        )
    }

    fn loaded(generation: u64, date: NaiveDate) -> Loaded {
        Loaded {
            generation,
            date,
            result: FetchResult::default(),
        }
    }

    #[test]
    fn response_for_an_earlier_date_is_dropped() {
        let mut state = state();
        let now = Instant::now();

        let (first, first_date) = state.begin_fetch();
        assert_eq!(state.on_line("n", d(20), now), Step::Moved(d(21)));
        let (second, second_date) = state.begin_fetch();
        assert_eq!(second_date, d(21));

        // The older fetch finishes last
        assert!(state.on_loaded(loaded(second, second_date)));
        assert!(!state.on_loaded(loaded(first, first_date)));
        assert_eq!(state.shown.as_ref().map(|l| l.date), Some(d(21)));
    }

    #[test]
    fn nothing_is_shown_until_the_latest_fetch_lands() {
        let mut state = state();
        let (first, date) = state.begin_fetch();
        let (second, _) = state.begin_fetch();

        assert!(!state.on_loaded(loaded(first, date)));
        assert!(state.shown.is_none());
        assert!(state.on_loaded(loaded(second, date)));
    }

    #[test]
    fn navigation_waits_for_the_debounce() {
        let mut state = state();
        let now = Instant::now();

        assert_eq!(state.on_line("n", d(20), now), Step::Moved(d(21)));
        assert_eq!(
            state.on_line("n", d(20), now + Duration::from_millis(100)),
            Step::Moved(d(22))
        );
        assert_eq!(
            state.debounce.deadline(),
            Some(now + Duration::from_millis(100) + DELAY)
        );

        let (_, date) = state.begin_fetch();
        assert_eq!(date, d(22));
        assert!(state.debounce.deadline().is_none());
    }

    #[test]
    fn retry_fetches_without_delay() {
        let mut state = state();
        let now = Instant::now();

        assert_eq!(state.on_line("r", d(20), now), Step::Retry);
        assert_eq!(state.debounce.deadline(), Some(now));
    }

    #[test]
    fn toggle_redraws_without_fetching() {
        let mut state = state();
        let (generation, date) = state.begin_fetch();
        assert!(state.on_loaded(loaded(generation, date)));

        assert_eq!(state.on_line("h earthwork", d(20), Instant::now()), Step::Redraw);
        assert!(!state.filter.is_visible(Category::Earthwork));
        assert!(state.debounce.deadline().is_none());
        assert!(state.generations.is_current(generation));

        state.on_line("h earthwork", d(20), Instant::now());
        assert!(state.filter.is_visible(Category::Earthwork));
    }

    #[test]
    fn other_input() {
        let mut state = state();
        let now = Instant::now();

        assert_eq!(state.on_line("t", d(20), now), Step::Unchanged);
        assert!(state.debounce.deadline().is_none());
        assert_eq!(state.on_line("what", d(20), now), Step::Help);
        assert_eq!(state.on_line("q", d(20), now), Step::Quit);
    }
}
