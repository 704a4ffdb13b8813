//! Tracing setup for registry-gql binaries.
//!
//! [`init_tracing`] installs the global subscriber once per process; later
//! calls are ignored.

use tracing::{Level, Subscriber};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `level` applies to every target.
/// With `json` set, log lines are newline-delimited JSON objects. Logs go to
/// stderr so stdout stays free for command output.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let (text, json) = output_layers(json);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(Layer::and_then(text, json))
        .try_init()
        .ok();
}

/// Exactly one stderr formatter: plain text or JSON.
fn output_layers<S>(json: bool) -> (Option<impl Layer<S>>, Option<impl Layer<S>>)
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    if json {
        (None, Some(layer.json()))
    } else {
        (Some(layer), None)
    }
}
