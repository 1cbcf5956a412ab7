// src/analytics/mod.rs
//! Content measurement for parsed block trees.

use crate::model::{Block, BlockVisitor, MediaContent};

/// Counts shown in debug logs for each parsed note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockMeasurement {
    pub total_blocks: usize,
    /// Image, file and PDF blocks.
    pub media_blocks: usize,
    /// Media blocks whose bytes must be uploaded.
    pub attachments: usize,
    pub tables: usize,
    pub deepest_nesting: usize,
}

/// Tallies media and tables; used through `Block::accept`.
struct MediaCounter<'m> {
    metrics: &'m mut BlockMeasurement,
}

impl MediaCounter<'_> {
    fn count_media(&mut self, media: &MediaContent) {
        self.metrics.media_blocks += 1;
        if media.resource().is_some() {
            self.metrics.attachments += 1;
        }
    }
}

impl BlockVisitor for MediaCounter<'_> {
    type Output = ();

    fn visit_table(&mut self, _table: &crate::model::TableBlock) {
        self.metrics.tables += 1;
    }

    fn visit_image(&mut self, media: &MediaContent) {
        self.count_media(media);
    }

    fn visit_file(&mut self, media: &MediaContent) {
        self.count_media(media);
    }

    fn visit_pdf(&mut self, media: &MediaContent) {
        self.count_media(media);
    }
}

/// Measures a forest of root blocks.
pub fn measure_blocks(blocks: &[Block]) -> BlockMeasurement {
    let mut metrics = BlockMeasurement::default();
    walk(&mut metrics, blocks, 1);
    metrics
}

fn walk(metrics: &mut BlockMeasurement, blocks: &[Block], depth: usize) {
    if !blocks.is_empty() {
        metrics.deepest_nesting = metrics.deepest_nesting.max(depth);
    }
    for block in blocks {
        metrics.total_blocks += 1;
        block.accept(&mut MediaCounter {
            metrics: &mut *metrics,
        });
        walk(metrics, block.children(), depth + 1);
    }
}
