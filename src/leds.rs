/// Pixel sink the animations draw into.
///
/// Writes are buffered until `show` pushes the frame to the physical strip.
pub trait LedOutput: Send {
    fn pixel_count(&self) -> usize;

    /// Out of range indices are ignored.
    fn set(&mut self, index: usize, color: palette::LinSrgb);

    fn fill(&mut self, color: palette::LinSrgb) {
        for i in 0..self.pixel_count() {
            self.set(i, color);
        }
    }

    fn show(&mut self);
}
