//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `delegator_core` linkage and walk the reference delegation graph.
//! - Keep output deterministic apart from the host id in the JSON snapshot.
//!
//! Usage: `delegator_cli [ABSOLUTE_LOG_DIR]`

mod demo;

use delegator_core::{default_log_level, init_logging, Attr, DelegationError, Delegator, Value};
use demo::Master;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = std::env::args().nth(1) {
        init_logging(default_log_level(), &log_dir)?;
    }
    println!("delegator_core version={}", delegator_core::core_version());

    let mut master = Delegator::new(Master::new());
    master.set_delegations([
        ("foo_obj", vec!["foo", "foo_property", "rabbit"]),
        ("bar_obj", vec!["rabbit_too"]),
    ])?;

    println!("foo -> {}", render(&master.invoke("foo", &[Value::from("hi there")])?));
    println!("foo_property -> {}", render_attr(&master.get("foo_property")?));
    println!("candidates -> {:?}", master.candidate_members());
    println!("delegatable -> {:?}", master.delegatable_symbols(None)?);
    println!("delegations -> {:?}", master.delegations());

    master.set_delegations([("rabbit", ["down_we_go"])])?;
    println!("down_we_go -> {}", render_attr(&master.get("down_we_go")?));

    match master.set_delegations([("rabbit_too", ["down_we_go"])]) {
        Err(err @ DelegationError::DuplicateSymbol(_)) => println!("rejected -> {err}"),
        other => other?,
    }

    println!("removed -> {:?}", master.remove_for_member("foo_obj"));
    master.set_delegations([("rabbit_too", ["down_we_go"])])?;
    println!("down_we_go -> {}", render_attr(&master.get("down_we_go")?));

    let added = master.delegate_methods("bar_obj")?;
    println!("delegated methods -> {added:?}");
    println!("bar_meth -> {}", render(&master.invoke("bar_meth", &[Value::from("ab")])?));
    println!("symbols -> {:?}", master.merged_symbols());
    println!("snapshot -> {}", serde_json::to_string(&master.snapshot())?);

    master.clear_all();
    println!("after clear -> {:?}", master.merged_symbols());
    Ok(())
}

fn render(value: &Value) -> String {
    match value {
        Value::Str(text) => text.clone(),
        other => format!("{other:?}"),
    }
}

fn render_attr(attr: &Attr) -> String {
    match attr {
        Attr::Value(value) => render(value),
        other => format!("{other:?}"),
    }
}
