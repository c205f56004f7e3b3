//! Non-linear RAM slider mapping
//!
//! RAM sizes span 8 GB to several TB, so the slider works on a 0-100
//! position that maps exponentially between `RAM_FLOOR_GB` and the dataset's
//! maximum. Outputs snap to multiples of 8 below 64 GB and to powers of two
//! from 64 GB upwards.

/// Lowest RAM value a slider position can map to
pub const RAM_FLOOR_GB: u32 = 8;

/// At and above this size slider values snap to powers of two
pub const POWER_OF_TWO_FROM_GB: u32 = 64;

/// Sizes at or above this many GB are displayed in TB
pub const TB_THRESHOLD_GB: u32 = 1024;

/// Upper end of the slider position range
pub const MAX_POSITION: f64 = 100.0;

/// Map a slider position in `[0, 100]` to a RAM size in GB.
///
/// Degenerate ranges (`max_ram <= 8`) always return `max_ram`.
pub fn scale(position: f64, max_ram: u32) -> u32 {
    if max_ram <= RAM_FLOOR_GB {
        return max_ram;
    }

    let position = if position.is_nan() {
        0.0
    } else {
        position.clamp(0.0, MAX_POSITION)
    };

    let floor = f64::from(RAM_FLOOR_GB);
    let ratio = f64::from(max_ram) / floor;
    let raw = floor * ratio.powf(position / MAX_POSITION);

    snap(raw).clamp(RAM_FLOOR_GB, max_ram)
}

/// Map a RAM size in GB back to its slider position in `[0, 100]`.
pub fn unscale(ram: u32, max_ram: u32) -> f64 {
    if max_ram <= RAM_FLOOR_GB || ram <= RAM_FLOOR_GB {
        return 0.0;
    }

    let floor = f64::from(RAM_FLOOR_GB);
    let position = (f64::from(ram) / floor).log2() / (f64::from(max_ram) / floor).log2();
    (position * MAX_POSITION).clamp(0.0, MAX_POSITION)
}

fn snap(raw: f64) -> u32 {
    if raw < f64::from(POWER_OF_TWO_FROM_GB) {
        let step = f64::from(RAM_FLOOR_GB);
        ((raw / step).round() * step) as u32
    } else {
        raw.log2().round().exp2() as u32
    }
}

/// Power-of-two tick marks from the floor up to `max_ram`
pub fn ram_marks(max_ram: u32) -> Vec<u32> {
    if max_ram == 0 {
        return Vec::new();
    }
    if max_ram <= RAM_FLOOR_GB {
        return vec![max_ram];
    }

    let mut marks: Vec<u32> = std::iter::successors(Some(RAM_FLOOR_GB), |mark| mark.checked_mul(2))
        .take_while(|&mark| mark <= max_ram)
        .collect();

    if marks.last() != Some(&max_ram) {
        marks.push(max_ram);
    }
    marks
}

/// Human-readable RAM size, switching from GB to TB at 1024 GB
pub fn format_ram(gb: u32) -> String {
    if gb >= TB_THRESHOLD_GB {
        let tb = format!("{:.2}", f64::from(gb) / f64::from(TB_THRESHOLD_GB));
        let tb = tb.trim_end_matches('0').trim_end_matches('.');
        format!("{} TB", tb)
    } else {
        format!("{} GB", gb)
    }
}
