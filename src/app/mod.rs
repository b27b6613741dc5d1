// Application layer: wires adapters and the engine into runnable jobs.

pub mod backfill;
