//! Shared type definitions for the Cagewatch event stream.
//!
//! This crate holds the shapes that cross the boundary between the
//! simulation engine, the Cagewatch core, and the dashboard. Types are
//! exported to `TypeScript` via `ts-rs` so the chart surface reads the same
//! definitions.
//!
//! # Modules
//!
//! - [`ids`] -- Integer id newtypes for mice and players
//! - [`enums`] -- Sex, behaviors, and tracked chart metrics
//! - [`structs`] -- Mouse payloads, participants, and end-of-game winners
//! - [`events`] -- The tagged cage event enum and its outcome variants

pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Behavior, Metric, Sex};
pub use events::{CageEvent, FightOutcome, MateOutcome};
pub use ids::{MouseId, PlayerId};
pub use structs::{Mouse, Participant, Winners};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs writes bindings for every #[ts(export)] type into the
        // `bindings/` directory relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::MouseId::export_all();
        let _ = crate::ids::PlayerId::export_all();

        let _ = crate::enums::Sex::export_all();
        let _ = crate::enums::Behavior::export_all();
        let _ = crate::enums::Metric::export_all();

        let _ = crate::structs::Mouse::export_all();
        let _ = crate::structs::Participant::export_all();
        let _ = crate::structs::Winners::export_all();

        let _ = crate::events::CageEvent::export_all();
        let _ = crate::events::FightOutcome::export_all();
        let _ = crate::events::MateOutcome::export_all();
    }
}
