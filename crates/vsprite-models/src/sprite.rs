//! Sprite sheet metadata document and grid layout math.

use serde::{Deserialize, Serialize};

use crate::video::VideoId;

/// Grid layout parameters for a sprite sheet.
///
/// A single sheet tiles up to `max_frames` thumbnails into a
/// `columns x rows` grid, one thumbnail per `thumbnail_interval` seconds
/// of video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteLayout {
    /// Seconds of video between consecutive thumbnails
    pub thumbnail_interval: u32,
    /// Width of one thumbnail cell in pixels
    pub thumbnail_width: u32,
    /// Height of one thumbnail cell in pixels
    pub thumbnail_height: u32,
    /// Grid columns
    pub columns: u32,
    /// Grid rows
    pub rows: u32,
    /// Cap on thumbnails tiled into the single sheet
    pub max_frames: u32,
}

impl Default for SpriteLayout {
    fn default() -> Self {
        Self {
            thumbnail_interval: 2,
            thumbnail_width: 160,
            thumbnail_height: 90,
            columns: 10,
            rows: 10,
            max_frames: 100,
        }
    }
}

impl SpriteLayout {
    /// Full sheet width in pixels.
    pub fn sprite_width(&self) -> u32 {
        self.columns * self.thumbnail_width
    }

    /// Full sheet height in pixels.
    pub fn sprite_height(&self) -> u32 {
        self.rows * self.thumbnail_height
    }

    /// Number of thumbnails actually tiled after applying the cap.
    pub fn capped_count(&self, frames_extracted: u32) -> u32 {
        frames_extracted.min(self.max_frames)
    }

    /// Pixel position of thumbnail `index` within the sheet.
    pub fn cell(&self, index: u32) -> (u32, u32) {
        let x = (index % self.columns) * self.thumbnail_width;
        let y = (index / self.columns) * self.thumbnail_height;
        (x, y)
    }

    /// Build the metadata document for a completed video.
    ///
    /// `frame_count` is the post-cap thumbnail count of the single sheet.
    pub fn build_metadata(
        &self,
        video_id: &VideoId,
        video_duration: f64,
        frame_count: u32,
    ) -> SpriteMetadata {
        let sheet = SpriteSheetEntry {
            index: 0,
            url: format!("/api/videos/{}/sprite/0", video_id),
            thumbnail_count: frame_count,
            start_time: 0,
            end_time: frame_count.saturating_sub(1) * self.thumbnail_interval,
        };

        let thumbnails = (0..frame_count)
            .map(|i| {
                let (x, y) = self.cell(i);
                ThumbnailCell {
                    index: i,
                    time: i * self.thumbnail_interval,
                    sprite_index: 0,
                    x,
                    y,
                }
            })
            .collect();

        SpriteMetadata {
            video_id: video_id.clone(),
            video_duration,
            thumbnail_interval: self.thumbnail_interval,
            total_thumbnails: frame_count,
            thumbnail_width: self.thumbnail_width,
            thumbnail_height: self.thumbnail_height,
            sprite_width: self.sprite_width(),
            sprite_height: self.sprite_height(),
            columns: self.columns,
            rows: self.rows,
            sprite_sheets: vec![sheet],
            thumbnails,
        }
    }
}

/// One sheet entry of the metadata document. Single-sheet only: index 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteSheetEntry {
    pub index: u32,
    pub url: String,
    pub thumbnail_count: u32,
    pub start_time: u32,
    pub end_time: u32,
}

/// Position of one thumbnail within its sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailCell {
    pub index: u32,
    /// Video time this thumbnail samples, in seconds
    pub time: u32,
    pub sprite_index: u32,
    pub x: u32,
    pub y: u32,
}

/// Derived metadata document, written once per completed video and never
/// mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteMetadata {
    pub video_id: VideoId,
    pub video_duration: f64,
    pub thumbnail_interval: u32,
    pub total_thumbnails: u32,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub sprite_width: u32,
    pub sprite_height: u32,
    pub columns: u32,
    pub rows: u32,
    pub sprite_sheets: Vec<SpriteSheetEntry>,
    pub thumbnails: Vec<ThumbnailCell>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_positions() {
        let layout = SpriteLayout::default();

        for i in 0..100u32 {
            let (x, y) = layout.cell(i);
            assert_eq!(x, (i % 10) * 160, "x mismatch at index {}", i);
            assert_eq!(y, (i / 10) * 90, "y mismatch at index {}", i);
        }

        // Spot checks: first cell, end of first row, start of second row
        assert_eq!(layout.cell(0), (0, 0));
        assert_eq!(layout.cell(9), (1440, 0));
        assert_eq!(layout.cell(10), (0, 90));
    }

    #[test]
    fn test_twenty_second_video() {
        // 20s video at a 2s interval yields 10 thumbnails on a 1600x900 sheet
        let layout = SpriteLayout::default();
        let meta = layout.build_metadata(&VideoId::from_string("v1"), 20.0, 10);

        assert_eq!(meta.total_thumbnails, 10);
        assert_eq!(meta.columns, 10);
        assert_eq!(meta.rows, 10);
        assert_eq!(meta.sprite_width, 1600);
        assert_eq!(meta.sprite_height, 900);
        assert_eq!(meta.thumbnails.len(), 10);
        assert_eq!(meta.sprite_sheets.len(), 1);

        let sheet = &meta.sprite_sheets[0];
        assert_eq!(sheet.index, 0);
        assert_eq!(sheet.url, "/api/videos/v1/sprite/0");
        assert_eq!(sheet.thumbnail_count, 10);
        assert_eq!(sheet.start_time, 0);
        assert_eq!(sheet.end_time, 18);

        // All 10 thumbnails sit on the first row
        for (i, thumb) in meta.thumbnails.iter().enumerate() {
            let i = i as u32;
            assert_eq!(thumb.index, i);
            assert_eq!(thumb.time, i * 2);
            assert_eq!(thumb.sprite_index, 0);
            assert_eq!(thumb.y, 0);
        }
    }

    #[test]
    fn test_frame_cap() {
        let layout = SpriteLayout::default();
        assert_eq!(layout.capped_count(7), 7);
        assert_eq!(layout.capped_count(100), 100);
        assert_eq!(layout.capped_count(250), 100);
    }

    #[test]
    fn test_metadata_wire_shape() {
        let layout = SpriteLayout::default();
        let meta = layout.build_metadata(&VideoId::from_string("v1"), 4.0, 2);
        let json = serde_json::to_value(&meta).unwrap();

        assert_eq!(json["videoId"], "v1");
        assert_eq!(json["videoDuration"], 4.0);
        assert_eq!(json["thumbnailInterval"], 2);
        assert_eq!(json["totalThumbnails"], 2);
        assert_eq!(json["spriteWidth"], 1600);
        assert_eq!(json["spriteHeight"], 900);
        assert_eq!(json["spriteSheets"][0]["thumbnailCount"], 2);
        assert_eq!(json["thumbnails"][1]["x"], 160);
        assert_eq!(json["thumbnails"][1]["y"], 0);
        assert_eq!(json["thumbnails"][1]["spriteIndex"], 0);
    }

    #[test]
    fn test_single_frame_sheet_times() {
        let layout = SpriteLayout::default();
        let meta = layout.build_metadata(&VideoId::from_string("v1"), 1.0, 1);
        assert_eq!(meta.sprite_sheets[0].start_time, 0);
        assert_eq!(meta.sprite_sheets[0].end_time, 0);
    }
}
