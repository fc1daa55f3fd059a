//! Capture viewer: the frame list of one interface capture and the decoded
//! headers of the selected frame.

use serde::{Deserialize, Serialize};
use topolab_decoder::{decode_packet, Layer};

use crate::error::{Error, Result};

/// One captured frame as the backend returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureFrame {
    /// Space-separated hex octets
    pub bytes: String,
    /// Printable rendering of the same octets
    #[serde(default)]
    pub ascii: String,
}

/// Where the backend keeps the capture of one interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRef {
    /// Interface the capture was taken on
    pub interface: String,
    /// Backend path of the capture
    pub file: String,
}

/// Frames of one capture and the current selection.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CaptureViewer {
    interface: Option<String>,
    frames: Vec<CaptureFrame>,
    selected: Option<usize>,
    layers: Vec<Layer>,
}

impl CaptureViewer {
    /// Create an empty viewer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the frames of `interface`. The first frame is selected.
    pub fn load(&mut self, interface: impl Into<String>, frames: Vec<CaptureFrame>) {
        self.interface = Some(interface.into());
        self.frames = frames;
        self.selected = None;
        self.layers.clear();
        if !self.frames.is_empty() {
            // Index 0 always exists here
            let _ = self.select(0);
        }
    }

    /// Empty the viewer.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Select a frame and decode it.
    pub fn select(&mut self, index: usize) -> Result<&[Layer]> {
        let frame = self.frames.get(index).ok_or(Error::FrameOutOfRange(index))?;
        self.layers = decode_packet(&frame.bytes);
        self.selected = Some(index);
        tracing::debug!(index, layers = self.layers.len(), "capture frame selected");
        Ok(&self.layers)
    }

    /// Interface the frames belong to.
    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    /// All frames.
    pub fn frames(&self) -> &[CaptureFrame] {
        &self.frames
    }

    /// Index of the selected frame.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Decoded headers of the selected frame.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topolab_decoder::Protocol;

    fn frame(bytes: &str) -> CaptureFrame {
        CaptureFrame {
            bytes: bytes.to_string(),
            ascii: String::new(),
        }
    }

    const ARP: &str = "ff ff ff ff ff ff 00 11 22 33 44 55 08 06 00 01 08 00 06 04 00 01 \
                       00 11 22 33 44 55 c0 a8 01 0a 00 00 00 00 00 00 c0 a8 01 01";
    const BPDU: &str = "01 80 c2 00 00 00 00 11 22 33 44 55 00 07 42 42 03 00 00 00 80";

    #[test]
    fn load_selects_first_frame() {
        let mut viewer = CaptureViewer::new();
        viewer.load("host_1_eth0", vec![frame(ARP), frame(BPDU)]);
        assert_eq!(viewer.interface(), Some("host_1_eth0"));
        assert_eq!(viewer.selected(), Some(0));
        assert_eq!(viewer.layers()[1].protocol, Protocol::Arp);
    }

    #[test]
    fn selecting_redecodes() {
        let mut viewer = CaptureViewer::new();
        viewer.load("sw", vec![frame(ARP), frame(BPDU)]);
        let layers = viewer.select(1).unwrap();
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[2].protocol, Protocol::SpanningTree);
        assert_eq!(viewer.selected(), Some(1));
    }

    #[test]
    fn out_of_range_keeps_selection() {
        let mut viewer = CaptureViewer::new();
        viewer.load("sw", vec![frame(ARP)]);
        assert!(matches!(viewer.select(5), Err(Error::FrameOutOfRange(5))));
        assert_eq!(viewer.selected(), Some(0));
        assert!(!viewer.layers().is_empty());
    }

    #[test]
    fn empty_capture_selects_nothing() {
        let mut viewer = CaptureViewer::new();
        viewer.load("sw", Vec::new());
        assert_eq!(viewer.selected(), None);
        assert!(viewer.layers().is_empty());
    }
}
