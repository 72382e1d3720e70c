use std::cmp::Ordering;
use std::ops::Index;
use std::slice;

/// The scanning state of a device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// No acquisition stream is running.
    Idle,
    /// The device is streaming scan samples.
    Scanning,
}

/// A single distance measurement from a laser scan.
///
/// Note: The internal representation uses integer milli-degrees and
/// centimeters, matching the resolution of the wire format. Use the
/// provided methods (`angle_degrees()`, `distance_meters()`) for
/// floating-point access.
#[derive(Debug, Clone, Copy, Eq)]
pub struct Sample {
    /// Angle in milli-degrees relative to the scanner's zero direction.
    pub angle: i32,
    /// Distance in centimeters.
    pub distance: i32,
    /// Signal strength indicator of the measurement (0-255). Higher values generally mean stronger returns.
    pub signal_strength: u8,
}

impl Sample {
    /// Returns the angle of the sample in degrees.
    #[inline]
    pub fn angle_degrees(&self) -> f32 {
        (self.angle as f32) / 1000f32
    }

    /// Returns the distance of the sample in meters.
    #[inline]
    pub fn distance_meters(&self) -> f32 {
        (self.distance as f32) / 100f32
    }
}

impl Ord for Sample {
    /// Compares `Sample`s based on their angle.
    fn cmp(&self, other: &Sample) -> Ordering {
        self.angle.cmp(&other.angle)
    }
}

impl PartialOrd for Sample {
    /// Partially compares `Sample`s based on their angle.
    fn partial_cmp(&self, other: &Sample) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Sample {
    /// Checks for equality based on all fields.
    fn eq(&self, other: &Sample) -> bool {
        self.angle == other.angle
            && self.distance == other.distance
            && self.signal_strength == other.signal_strength
    }
}

/// One rotation of samples assembled from the acquisition stream.
///
/// A `Scan` is immutable once returned: it can be indexed, iterated and
/// dropped, never grown. Indexing past the end panics, like any slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    samples: Vec<Sample>,
}

impl Scan {
    pub(crate) fn new(samples: Vec<Sample>) -> Scan {
        Scan { samples }
    }

    /// Number of samples in the rotation.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` when the rotation holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The samples in acquisition order.
    #[inline]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Iterates over the samples in acquisition order.
    pub fn iter(&self) -> slice::Iter<'_, Sample> {
        self.samples.iter()
    }
}

impl Index<usize> for Scan {
    type Output = Sample;

    fn index(&self, index: usize) -> &Sample {
        &self.samples[index]
    }
}

impl<'a> IntoIterator for &'a Scan {
    type Item = &'a Sample;
    type IntoIter = slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

impl IntoIterator for Scan {
    type Item = Sample;
    type IntoIter = std::vec::IntoIter<Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.into_iter()
    }
}
