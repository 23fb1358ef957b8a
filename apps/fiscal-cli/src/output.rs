use anyhow::Result;
use serde::Serialize;

use fiscal_core::types::{Hit, SearchResponse};
use fiscal_retrieval::{ComponentHealth, HealthReport};

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn snippet(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > 160 {
        format!("{}…", flat.chars().take(160).collect::<String>())
    } else {
        flat
    }
}

fn print_hit(i: usize, hit: &Hit) {
    let id = hit.metadata.get("doc_id").and_then(|v| v.as_str()).unwrap_or("-");
    println!("  {}. score={:.4}  [{}]  id={}", i + 1, hit.score, hit.source_type, id);
    println!("     {}", snippet(&hit.text));
}

pub fn print_response(response: &SearchResponse) {
    println!("🔍 {}", response.query_text);
    for group in &response.sources {
        println!("\n{} ({} hits)", group.source_type, group.hits.len());
        for (i, hit) in group.hits.iter().enumerate() {
            print_hit(i, hit);
        }
    }
    if let Some(aggregated) = &response.aggregated_results {
        println!("\n📊 {} unique hits across channels", aggregated.len());
    }
    if let Some(status) = &response.callback_status {
        println!("📨 callback {status}");
    }
}

fn component(label: &str, c: &ComponentHealth) {
    match (c.available, c.reachable) {
        (true, Some(false)) => println!("❌ {label}: {} unreachable", c.name.as_deref().unwrap_or("?")),
        (true, _) => println!("✅ {label}: {}", c.name.as_deref().unwrap_or("?")),
        (false, _) => println!("⚠️  {label}: unavailable ({})", c.reason.as_deref().unwrap_or("unknown")),
    }
}

pub fn print_health(report: &HealthReport) {
    component("backend", &report.backend);
    component("embedding", &report.embedding);
}
