//! Rendering of controller snapshots. Nothing here touches the controller or
//! the clock; the snapshot carries the instant it was taken.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::{
    config::TargetBounds,
    types::{StatusPayload, ZoneStatus},
    zone::{Snapshot, ZoneState},
};

#[derive(Debug, Clone, Copy)]
pub struct StatusPresenter {
    bounds: TargetBounds,
}

impl StatusPresenter {
    pub fn new(bounds: TargetBounds) -> Self {
        Self { bounds }
    }

    pub fn payload(&self, snapshot: &Snapshot) -> StatusPayload {
        StatusPayload {
            zones: snapshot
                .zones
                .iter()
                .map(|zone| zone_status(zone, snapshot.captured_at_ms))
                .collect(),
        }
    }

    pub fn html(&self, snapshot: &Snapshot, rendered_at: DateTime<Utc>) -> String {
        let now_ms = snapshot.captured_at_ms;
        let mut form = String::new();
        let mut status = String::new();
        let mut opened = String::new();

        for zone in &snapshot.zones {
            let id = zone.id();
            let name = escape_html(zone.name());

            let _ = write!(
                form,
                r#"<label for="zone{id}" class="label">Target for {name}:</label>
<input type="number" id="zone{id}" data-zone="{id}" class="input target" min="{min}" max="{max}" step="0.1" value="{target:.1}" required><br><br>
"#,
                min = self.bounds.min_c,
                max = self.bounds.max_c,
                target = zone.target_c(),
            );

            let _ = writeln!(
                status,
                "<p>{name}: Temperature: {temp}, Relay: {relay}, Door: {door}</p>",
                temp = reading_label(zone),
                relay = if zone.relay_engaged() { "On" } else { "Off" },
                door = door_label(zone, now_ms),
            );

            let _ = writeln!(opened, "<p>{name}: {}</p>", door_label(zone, now_ms));
        }

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Thermaguard</title>
<style>
body {{ font-family: monospace; background-color: #b3cde0; color: #011f4b; }}
.label {{ color: #011f4b; }}
.input {{ background-color: #b3cde0; color: #011f4b; border: 1px solid #011f4b; border-radius: 4px; padding: 8px; font-family: monospace; }}
.button {{ background-color: #03396c; color: #b3cde0; border: none; border-radius: 4px; padding: 10px 20px; cursor: pointer; font-family: monospace; }}
.button:hover {{ background-color: #005b96; }}
.heading {{ color: #005b96; }}
.status {{ margin-top: 20px; }}
</style>
</head>
<body>
<h1 class="heading">Thermaguard</h1>
<form id="targetForm">
{form}<button type="submit" class="button">Save</button>
</form>
<p id="formResult"></p>
<div class="status">
<h2 class="heading">Status</h2>
{status}</div>
<div class="status">
<h2 class="heading">Last opened</h2>
{opened}</div>
<footer>Rendered {rendered}</footer>
<script>
document.getElementById("targetForm").addEventListener("submit", function (event) {{
  event.preventDefault();
  var targets = Array.from(document.querySelectorAll("input.target")).map(function (input) {{
    return {{ zoneId: parseInt(input.dataset.zone, 10), value: parseFloat(input.value) }};
  }});
  fetch("/targets", {{
    method: "POST",
    headers: {{ "Content-Type": "application/json" }},
    body: JSON.stringify({{ targets: targets }})
  }})
    .then(function (response) {{
      return response.json().then(function (body) {{
        document.getElementById("formResult").textContent = response.ok ? "Saved" : body.error;
      }});
    }})
    .catch(function (error) {{
      document.getElementById("formResult").textContent = error;
    }});
}});
</script>
</body>
</html>
"#,
            rendered = rendered_at.format("%Y-%m-%d %H:%M:%S UTC"),
        )
    }
}

fn zone_status(zone: &ZoneState, now_ms: u64) -> ZoneStatus {
    ZoneStatus {
        id: zone.id(),
        name: zone.name().to_string(),
        temperature: zone.current_reading_c(),
        relay_on: zone.relay_engaged(),
        door_open: zone.door_open(),
        door_open_seconds: zone.door_open_ms(now_ms).map(ms_to_seconds),
        target: zone.target_c(),
    }
}

fn reading_label(zone: &ZoneState) -> String {
    match zone.current_reading_c() {
        Some(reading) => format!("{reading:.1}C"),
        None => "unavailable".to_string(),
    }
}

fn door_label(zone: &ZoneState, now_ms: u64) -> String {
    match zone.door_open_ms(now_ms) {
        Some(open_ms) => format!("open for {:.2} seconds", ms_to_seconds(open_ms)),
        None => "not open".to_string(),
    }
}

fn ms_to_seconds(ms: u64) -> f64 {
    ms as f64 / 1_000.0
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
