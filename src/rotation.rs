use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Clockwise page rotation, in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    None,
    Right, // 90° clockwise
    Down,  // 180°
    Left,  // 270° clockwise (90° counter-clockwise)
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::None,
        Rotation::Right,
        Rotation::Down,
        Rotation::Left,
    ];

    /// Normalize a `/Rotate`-style value. Negative multiples of 90 are accepted
    /// and wrapped; anything else is rejected.
    pub fn from_degrees(degrees: i64) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        Some(match degrees.rem_euclid(360) {
            0 => Rotation::None,
            90 => Rotation::Right,
            180 => Rotation::Down,
            _ => Rotation::Left,
        })
    }

    pub fn degrees(self) -> i64 {
        match self {
            Rotation::None => 0,
            Rotation::Right => 90,
            Rotation::Down => 180,
            Rotation::Left => 270,
        }
    }

    /// One quarter turn clockwise. Four steps return to the start.
    pub fn next(self) -> Self {
        match self {
            Rotation::None => Rotation::Right,
            Rotation::Right => Rotation::Down,
            Rotation::Down => Rotation::Left,
            Rotation::Left => Rotation::None,
        }
    }

    /// Layer a relative `delta` on top of this rotation.
    pub fn compose(self, delta: Rotation) -> Self {
        let mut out = self;
        for _ in 0..delta.quarter_turns() {
            out = out.next();
        }
        out
    }

    /// Whether width and height trade places when a page is turned this way.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Right | Rotation::Left)
    }

    fn quarter_turns(self) -> u8 {
        (self.degrees() / 90) as u8
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

impl FromStr for Rotation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_suffix('°').unwrap_or(s);
        let degrees: i64 = s
            .parse()
            .map_err(|_| format!("Invalid rotation: {}", s))?;
        Rotation::from_degrees(degrees)
            .ok_or_else(|| format!("Rotation must be a multiple of 90 degrees: {}", degrees))
    }
}

impl Serialize for Rotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.degrees())
    }
}

impl<'de> Deserialize<'de> for Rotation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let degrees = i64::deserialize(deserializer)?;
        Rotation::from_degrees(degrees).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "rotation must be a multiple of 90 degrees, got {}",
                degrees
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_rotation() -> impl Strategy<Value = Rotation> {
        prop::sample::select(Rotation::ALL.to_vec())
    }

    #[test]
    fn test_next_cycles() {
        assert_eq!(Rotation::None.next(), Rotation::Right);
        assert_eq!(Rotation::Right.next(), Rotation::Down);
        assert_eq!(Rotation::Down.next(), Rotation::Left);
        assert_eq!(Rotation::Left.next(), Rotation::None);
    }

    #[test]
    fn test_compose() {
        assert_eq!(Rotation::Right.compose(Rotation::Right), Rotation::Down);
        assert_eq!(Rotation::Left.compose(Rotation::Down), Rotation::Right);
        assert_eq!(Rotation::Down.compose(Rotation::None), Rotation::Down);
    }

    #[test]
    fn test_from_degrees_normalizes() {
        assert_eq!(Rotation::from_degrees(0), Some(Rotation::None));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Right));
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::Left));
        assert_eq!(Rotation::from_degrees(45), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!("90".parse::<Rotation>().unwrap(), Rotation::Right);
        assert_eq!(" 270° ".parse::<Rotation>().unwrap(), Rotation::Left);
        assert!("30".parse::<Rotation>().is_err());
        assert!("left".parse::<Rotation>().is_err());
    }

    #[test]
    fn test_serde_as_integer() {
        assert_eq!(serde_json::to_string(&Rotation::Down).unwrap(), "180");
        let r: Rotation = serde_json::from_str("-90").unwrap();
        assert_eq!(r, Rotation::Left);
        assert!(serde_json::from_str::<Rotation>("100").is_err());
    }

    proptest! {
        #[test]
        fn next_four_times_is_identity(r in any_rotation()) {
            prop_assert_eq!(r.next().next().next().next(), r);
        }

        #[test]
        fn compose_matches_modular_addition(a in any_rotation(), b in any_rotation()) {
            prop_assert_eq!(a.compose(b).degrees(), (a.degrees() + b.degrees()) % 360);
            prop_assert_eq!(a.compose(b), b.compose(a));
        }

        #[test]
        fn compose_is_associative(a in any_rotation(), b in any_rotation(), c in any_rotation()) {
            prop_assert_eq!(a.compose(b).compose(c), a.compose(b.compose(c)));
        }
    }
}
