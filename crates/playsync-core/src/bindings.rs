//! TypeScript bindings for the browser surface.

use crate::scroll::{AlignMode, ScrollConfig};
use crate::segment::Segment;
use crate::throttle::{PlaybackSample, ProgressRecord};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use ts_rs::TS;

const INDEX_CONTENT: &str = r#"export type { Segment } from "./Segment";
export type { PlaybackSample } from "./PlaybackSample";
export type { ProgressRecord } from "./ProgressRecord";
export type { AlignMode } from "./AlignMode";
export type { ScrollConfig } from "./ScrollConfig";
"#;

fn export_single_type<T: TS + 'static>(out_dir: &Path) -> Result<()> {
    T::export_all_to(out_dir).with_context(|| format!("Exporting {}", T::name()))
}

/// Regenerate every `.ts` file in `out_dir`, plus an `index.ts`.
pub fn export_ts_bindings(out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir).with_context(|| format!("Creating {}", out_dir.display()))?;

    for entry in fs::read_dir(out_dir).with_context(|| format!("Listing {}", out_dir.display()))? {
        let path = entry.context("Reading bindings dir entry")?.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("ts") {
            fs::remove_file(&path).with_context(|| format!("Removing {}", path.display()))?;
        }
    }

    export_single_type::<Segment>(out_dir)?;
    export_single_type::<PlaybackSample>(out_dir)?;
    export_single_type::<ProgressRecord>(out_dir)?;
    export_single_type::<AlignMode>(out_dir)?;
    export_single_type::<ScrollConfig>(out_dir)?;

    let index = out_dir.join("index.ts");
    fs::write(&index, INDEX_CONTENT).with_context(|| format!("Writing {}", index.display()))
}
