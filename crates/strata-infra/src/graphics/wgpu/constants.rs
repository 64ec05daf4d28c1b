// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use strata_core::renderer::RenderError;

/// Bytes of a single constant buffer binding window.
pub const MAX_CONSTANT_BUFFER_SIZE: u64 = 4096;

/// Bytes reserved per frame slot for constant data.
pub const REGION_SIZE: u64 = 1 << 20;

/// Offset bookkeeping of the constant ring, independent of any device.
///
/// The ring is split into one region per frame slot. Uploads are appended to
/// the active region at the device's uniform offset alignment and staged on
/// the CPU until the next submission flushes them.
#[derive(Debug)]
pub(crate) struct RingCursor {
    regions: usize,
    alignment: u64,
    region: usize,
    cursor: u64,
    flushed: u64,
}

impl RingCursor {
    pub(crate) fn new(regions: usize, alignment: u64) -> Self {
        Self {
            regions: regions.max(1),
            alignment: alignment.max(4),
            region: 0,
            cursor: 0,
            flushed: 0,
        }
    }

    pub(crate) fn total_size(&self) -> u64 {
        self.regions as u64 * REGION_SIZE
    }

    /// Makes `slot` the active region and forgets what it held.
    pub(crate) fn begin_region(&mut self, slot: usize) {
        self.region = slot % self.regions;
        self.cursor = 0;
        self.flushed = 0;
    }

    /// Reserves room for `len` bytes.
    ///
    /// Returns the offset inside the region and the absolute offset inside the
    /// ring buffer. A full binding window always fits behind the returned offset.
    pub(crate) fn allocate(&mut self, len: u64) -> Result<(u64, u64), RenderError> {
        if len > MAX_CONSTANT_BUFFER_SIZE {
            return Err(RenderError::Backend(format!(
                "constant data of {len} bytes exceeds the {MAX_CONSTANT_BUFFER_SIZE} byte binding window"
            )));
        }
        let local = self.cursor;
        if local + MAX_CONSTANT_BUFFER_SIZE > REGION_SIZE {
            return Err(RenderError::Backend(format!(
                "constant ring region {} is full ({REGION_SIZE} bytes)",
                self.region
            )));
        }
        self.cursor = align_up(local + len.max(1), self.alignment);
        Ok((local, self.region as u64 * REGION_SIZE + local))
    }

    /// The staged bytes not yet written to the GPU, as a local range, and the
    /// absolute offset of its start. Marks them flushed.
    pub(crate) fn take_unflushed(&mut self) -> Option<(std::ops::Range<usize>, u64)> {
        if self.flushed == self.cursor {
            return None;
        }
        let range = self.flushed as usize..self.cursor as usize;
        let absolute = self.region as u64 * REGION_SIZE + self.flushed;
        self.flushed = self.cursor;
        Some((range, absolute))
    }
}

fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

/// The uniform buffer every constant buffer slot is bound into with a
/// dynamic offset.
pub(crate) struct ConstantRing {
    buffer: wgpu::Buffer,
    staging: Vec<u8>,
    cursor: RingCursor,
}

impl ConstantRing {
    pub(crate) fn new(device: &wgpu::Device, regions: usize, alignment: u32) -> Self {
        let cursor = RingCursor::new(regions, alignment as u64);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Strata Constant Ring"),
            size: cursor.total_size(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            staging: vec![0; REGION_SIZE as usize],
            cursor,
        }
    }

    pub(crate) fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub(crate) fn begin_region(&mut self, slot: usize) {
        self.cursor.begin_region(slot);
    }

    /// Stages `data` and returns the dynamic offset it will be bound at.
    pub(crate) fn push(&mut self, data: &[u8]) -> Result<u32, RenderError> {
        let (local, absolute) = self.cursor.allocate(data.len() as u64)?;
        let start = local as usize;
        self.staging[start..start + data.len()].copy_from_slice(data);
        u32::try_from(absolute)
            .map_err(|_| RenderError::Backend(format!("constant offset {absolute} overflows u32")))
    }

    /// Writes everything staged since the last flush to the GPU buffer.
    ///
    /// Must run before the submission whose commands read the data.
    pub(crate) fn flush(&mut self, queue: &wgpu::Queue) {
        if let Some((range, offset)) = self.cursor.take_unflushed() {
            queue.write_buffer(&self.buffer, offset, &self.staging[range]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocations_are_aligned_and_offset_by_region() {
        let mut ring = RingCursor::new(2, 256);
        assert_eq!(ring.allocate(64).unwrap(), (0, 0));
        assert_eq!(ring.allocate(300).unwrap(), (256, 256));
        assert_eq!(ring.allocate(4).unwrap(), (768, 768));

        ring.begin_region(1);
        assert_eq!(ring.allocate(16).unwrap(), (0, REGION_SIZE));
    }

    #[test]
    fn test_slots_wrap_onto_existing_regions() {
        let mut ring = RingCursor::new(2, 256);
        ring.begin_region(3);
        assert_eq!(ring.allocate(16).unwrap().1, REGION_SIZE);
    }

    #[test]
    fn test_oversized_uploads_are_rejected() {
        let mut ring = RingCursor::new(1, 256);
        assert!(ring.allocate(MAX_CONSTANT_BUFFER_SIZE + 1).is_err());
        assert!(ring.allocate(MAX_CONSTANT_BUFFER_SIZE).is_ok());
    }

    #[test]
    fn test_full_region_reports_an_error() {
        let mut ring = RingCursor::new(1, 256);
        let fits = (REGION_SIZE - MAX_CONSTANT_BUFFER_SIZE) / 256 + 1;
        for _ in 0..fits {
            ring.allocate(16).unwrap();
        }
        assert!(ring.allocate(16).is_err());

        ring.begin_region(0);
        assert!(ring.allocate(16).is_ok());
    }

    #[test]
    fn test_flush_hands_out_each_byte_once() {
        let mut ring = RingCursor::new(2, 256);
        ring.begin_region(1);
        ring.allocate(16).unwrap();
        ring.allocate(16).unwrap();
        assert_eq!(ring.take_unflushed(), Some((0..512, REGION_SIZE)));
        assert_eq!(ring.take_unflushed(), None);

        ring.allocate(16).unwrap();
        assert_eq!(ring.take_unflushed(), Some((512..768, REGION_SIZE + 512)));
    }
}
