pub mod command_parser;
pub mod config;
pub mod contract;
pub mod env;
pub mod fuzzy;
pub mod handlers;
pub mod host;
pub mod input;
pub mod logging;
pub mod matching;
pub mod mode;
pub mod ranking;
pub mod router;
pub mod runtime;
pub mod settings;
pub mod suggestion;
pub mod symbols;
pub mod vault;

#[cfg(test)]
mod tests {
    mod query_latency_test {
        include!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../tests/perf/query_latency_test.rs"
        ));
    }
}
