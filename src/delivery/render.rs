// src/delivery/render.rs
//! Plain renderers for the digest body. Layout only; no template engine.

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write as _;

use crate::item::Item;
use crate::select::DigestPayload;

/// `Daily digest [9/6]`, dated in the reader's offset.
pub fn subject(now: DateTime<Utc>, offset: FixedOffset) -> String {
    let local = now.with_timezone(&offset);
    format!("Daily digest [{}/{}]", local.month(), local.day())
}

pub fn render_text(payload: &DigestPayload) -> String {
    let mut out = String::new();
    if !payload.highlights.is_empty() {
        out.push_str("Highlights\n");
        for it in &payload.highlights {
            text_line(&mut out, it);
        }
    }
    for b in &payload.buckets {
        let _ = writeln!(out, "\n== {} ==", b.category);
        for it in &b.items {
            text_line(&mut out, it);
        }
    }
    out
}

fn text_line(out: &mut String, it: &Item) {
    let _ = writeln!(out, "- {} ({})\n  {}", it.title, it.channel, it.url);
}

pub fn render_html(payload: &DigestPayload, heading: &str) -> String {
    let mut out = String::with_capacity(4096);
    let _ = write!(
        out,
        "<div style=\"font-family: serif; max-width: 600px; margin: 0 auto;\"><h1>{}</h1>",
        encode_text(heading)
    );
    if !payload.highlights.is_empty() {
        out.push_str("<h2>Highlights</h2>");
        for it in &payload.highlights {
            html_card(&mut out, it, true);
        }
    }
    for b in &payload.buckets {
        let _ = write!(out, "<h2>{}</h2>", encode_text(&b.category));
        for it in &b.items {
            html_card(&mut out, it, false);
        }
    }
    out.push_str("</div>");
    out
}

fn html_card(out: &mut String, it: &Item, with_thumbnail: bool) {
    out.push_str("<div style=\"margin-bottom: 20px;\">");
    if with_thumbnail {
        if let Some(t) = it.thumbnail.as_deref() {
            let _ = write!(
                out,
                "<img src=\"{}\" alt=\"\" style=\"width: 100%;\">",
                encode_double_quoted_attribute(t)
            );
        }
    }
    let _ = write!(
        out,
        "<h3 style=\"margin: 0 0 5px 0;\"><a href=\"{}\">{}</a></h3><p style=\"margin: 0; font-size: 14px;\">{} &middot; {}</p></div>",
        encode_double_quoted_attribute(&it.url),
        encode_text(&it.title),
        encode_text(&it.channel),
        encode_text(&it.description),
    );
}
