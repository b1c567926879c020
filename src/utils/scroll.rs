/// Scroll position for the transcript view.
///
/// While `follow` is set the view sticks to the newest output. Scrolling up
/// detaches it; scrolling back to the bottom re-attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollState {
    offset: usize,
    follow: bool,
    max_offset: usize,
    viewport: usize,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            offset: 0,
            follow: true,
            max_offset: 0,
            viewport: 0,
        }
    }
}

impl ScrollState {
    /// Record the latest content height and viewport height, and clamp.
    pub fn update_bounds(&mut self, content_lines: usize, viewport: usize) {
        self.viewport = viewport;
        self.max_offset = content_lines.saturating_sub(viewport);
        if self.follow || self.offset >= self.max_offset {
            self.offset = self.max_offset;
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn follow(&mut self) {
        self.follow = true;
        self.offset = self.max_offset;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        if lines == 0 || self.offset == 0 {
            return;
        }
        self.offset = self.offset.saturating_sub(lines);
        self.follow = false;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.offset = (self.offset + lines).min(self.max_offset);
        if self.offset >= self.max_offset {
            self.follow = true;
        }
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.page_size());
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.page_size());
    }

    fn page_size(&self) -> usize {
        self.viewport.saturating_sub(1).max(1)
    }
}
