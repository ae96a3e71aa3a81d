/// Two buffers whose read/write roles alternate every frame.
///
/// `curr` is written by the next fluid pass, `prev` is what it reads.
#[derive(Debug, Clone, Copy)]
pub struct PingPong<T> {
    pub curr: T,
    pub prev: T,
    swaps: u64,
}

impl<T: Copy> PingPong<T> {
    pub fn new(curr: T, prev: T) -> Self {
        Self { curr, prev, swaps: 0 }
    }

    pub fn swap(&mut self) {
        core::mem::swap(&mut self.curr, &mut self.prev);
        self.swaps += 1;
    }

    pub fn swaps(&self) -> u64 {
        self.swaps
    }

    pub fn both(&self) -> [T; 2] {
        [self.curr, self.prev]
    }
}
