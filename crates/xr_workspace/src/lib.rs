// This is a dummy lib.rs, maintained by cargo-hakari.
