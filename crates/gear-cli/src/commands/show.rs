//! Show command

use colored::Colorize;
use gear_order::{Entry, ListState, Payload};
use serde::Serialize;

use crate::context::Session;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct ListView<'a> {
    id: &'a str,
    title: &'a str,
    categories: Vec<CategoryView<'a>>,
}

#[derive(Debug, Serialize)]
struct CategoryView<'a> {
    id: &'a str,
    title: &'a str,
    position: usize,
    items: Vec<ItemView<'a>>,
}

#[derive(Debug, Serialize)]
struct ItemView<'a> {
    id: &'a str,
    position: usize,
    fields: &'a Payload,
}

fn view<'a>(session: &'a Session, state: &'a ListState) -> ListView<'a> {
    ListView {
        id: session.record.id.as_str(),
        title: &session.record.title,
        categories: state
            .containers()
            .iter()
            .map(|c| CategoryView {
                id: c.id.as_str(),
                title: &c.title,
                position: c.position,
                items: state
                    .entries(&c.id)
                    .iter()
                    .map(|e| ItemView {
                        id: e.id.as_str(),
                        position: e.position,
                        fields: &e.payload,
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Print the list as a tree, or as JSON
pub async fn run_show(session: &Session, json: bool) -> Result<()> {
    let state = session.state().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&view(session, &state))?);
        return Ok(());
    }

    println!("{}", session.record.title.bold());
    if state.containers().is_empty() {
        println!("  {}", "(no categories)".dimmed());
    }
    for container in state.containers() {
        let entries = state.entries(&container.id);
        println!(
            "{} {} {}",
            format!("{}.", container.position + 1).cyan(),
            container.title.cyan().bold(),
            format!("({})", entries.len()).dimmed()
        );
        for entry in entries {
            println!("   {:>2}. {}{}", entry.position + 1, label(entry), extras(entry));
        }
    }
    Ok(())
}

fn label(entry: &Entry) -> String {
    entry.name().unwrap_or(entry.id.as_str()).to_string()
}

fn extras(entry: &Entry) -> String {
    let fields: Vec<String> = entry
        .payload
        .iter()
        .filter(|(key, _)| key.as_str() != "name")
        .map(|(key, value)| match value.as_str() {
            Some(text) => format!("{key}={text}"),
            None => format!("{key}={value}"),
        })
        .collect();
    if fields.is_empty() {
        String::new()
    } else {
        format!(" {}", fields.join(" ").dimmed())
    }
}
