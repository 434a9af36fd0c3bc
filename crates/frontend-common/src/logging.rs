//! Browser console logging

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_web::MakeWebConsoleWriter;

/// Route `tracing` events and `log` records to the browser console
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_writer(MakeWebConsoleWriter::new());

    if tracing_subscriber::registry().with(fmt_layer).try_init().is_ok() {
        wasm_logger::init(wasm_logger::Config::default());
    }
}
