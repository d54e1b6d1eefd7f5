/// Yields the non-empty Adam7 passes of a `width × height` image in file order.
pub(crate) struct Adam7Iter {
    current_pass: Option<usize>,
    width: usize,
    height: usize,
}
impl Adam7Iter {
    pub(crate) fn new(width: usize, height: usize) -> Self {
        Self {
            current_pass: Some(0),
            width,
            height,
        }
    }

    const STARTING_ROW: [usize; 7] = [0, 0, 4, 0, 2, 0, 1];
    const STARTING_COL: [usize; 7] = [0, 4, 0, 2, 0, 1, 0];
    const ROW_INCREMENT: [usize; 7] = [8, 8, 8, 4, 4, 2, 2];
    const COL_INCREMENT: [usize; 7] = [8, 8, 4, 4, 2, 2, 1];
}
impl Iterator for Adam7Iter {
    type Item = SubImage;
    fn next(&mut self) -> Option<Self::Item> {
        let mut pass = self.current_pass?;
        while pass < 7 {
            let pass_width = self
                .width
                .saturating_sub(Self::STARTING_COL[pass])
                .div_ceil(Self::COL_INCREMENT[pass]);
            let pass_height = self
                .height
                .saturating_sub(Self::STARTING_ROW[pass])
                .div_ceil(Self::ROW_INCREMENT[pass]);
            // Small images leave some passes empty; those have no scanlines at all.
            if pass_width == 0 || pass_height == 0 {
                pass += 1;
                continue;
            }
            self.current_pass = (pass < 6).then_some(pass + 1);
            return Some(SubImage {
                width: pass_width,
                height: pass_height,
                pass,
            });
        }
        self.current_pass = None;
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SubImage {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pass: usize,
}
impl SubImage {
    /// Maps pass-local coordinates to an index in the full image's row-major buffer.
    pub(crate) fn pixel_index(&self, x: usize, y: usize, image_width: usize) -> usize {
        let row = Adam7Iter::STARTING_ROW[self.pass] + y * Adam7Iter::ROW_INCREMENT[self.pass];
        let col = Adam7Iter::STARTING_COL[self.pass] + x * Adam7Iter::COL_INCREMENT[self.pass];
        row * image_width + col
    }
}
