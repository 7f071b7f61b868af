//! macOS test binary for permsheet-sheet.
//!
//! Run with: cargo run -p permsheet-sheet-test

use permsheet_permission::PermissionKind;
use permsheet_sheet::{PermissionSheet, SheetEvent};

#[tokio::main]
async fn main() {
    println!("=== Permsheet Sequencer Test (macOS) ===\n");

    for kind in PermissionKind::ALL {
        println!(
            "{:<14} [{}] {:?}",
            kind.label(),
            kind.icon(),
            permsheet_permission::check(kind)
        );
    }
    println!();

    let mut sheet = PermissionSheet::system(PermissionKind::ALL);
    let events = sheet.subscribe();

    if !sheet.is_visible() {
        println!("✓ Everything already granted, sheet not shown");
        return;
    }

    println!("Walking through prompts...");
    sheet.run().await;

    for event in events.drain() {
        if let SheetEvent::Recorded(state) = event {
            println!("  {} -> {:?}", state.label(), state.authorization);
        }
    }

    match sheet.dismiss() {
        Ok(()) => println!("\n✓ All permissions granted, sheet dismissed"),
        Err(e) => {
            println!("\n✗ Sheet stays up: {e}");
            if sheet.has_any_denial() {
                println!("Opening system settings...");
                sheet.open_settings();
            }
        }
    }
}
