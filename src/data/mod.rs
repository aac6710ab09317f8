/// Data layer: core types, loading, alignment, topology and filtering.
///
/// Architecture:
/// ```text
///  .fa / _profile.txt / rings.txt / pairmap.txt / .ct / .db / .coords / .pdb
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → LoadedData (local numbering)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ registry  │  align to the canonical Sequence → global numbering
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ structure  │  pairs, helices, nesting / crossing
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  threshold / distance filters, classes, sensitivity / PPV
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod registry;
pub mod structure;
