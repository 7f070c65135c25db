use nalgebra::Point3;
use phf::phf_map;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Chemical element of an atom.
///
/// Only the elements a small organic scene needs are listed. The atomic number
/// is what the remote scoring service expects in its `species` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    Hydrogen,
    Carbon,
    Nitrogen,
    Oxygen,
    Fluorine,
    Sulfur,
    Chlorine,
}

static ELEMENT_SYMBOLS: phf::Map<&'static str, Element> = phf_map! {
    "H" => Element::Hydrogen,
    "C" => Element::Carbon,
    "N" => Element::Nitrogen,
    "O" => Element::Oxygen,
    "F" => Element::Fluorine,
    "S" => Element::Sulfur,
    "CL" => Element::Chlorine,
};

impl Element {
    /// Returns the atomic number (proton count) of the element.
    pub fn atomic_number(&self) -> u8 {
        match self {
            Element::Hydrogen => 1,
            Element::Carbon => 6,
            Element::Nitrogen => 7,
            Element::Oxygen => 8,
            Element::Fluorine => 9,
            Element::Sulfur => 16,
            Element::Chlorine => 17,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Element::Hydrogen => "H",
            Element::Carbon => "C",
            Element::Nitrogen => "N",
            Element::Oxygen => "O",
            Element::Fluorine => "F",
            Element::Sulfur => "S",
            Element::Chlorine => "Cl",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown element symbol '{0}'")]
pub struct ParseElementError(pub String);

impl FromStr for Element {
    type Err = ParseElementError;

    /// Parses an element symbol case-insensitively (e.g. "C", "h", "Cl").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ELEMENT_SYMBOLS
            .get(s.trim().to_ascii_uppercase().as_str())
            .copied()
            .ok_or_else(|| ParseElementError(s.to_string()))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.symbol())
    }
}

/// An atom of the scene molecule.
///
/// The rest position is expressed in atomic units (Angstroms), before the
/// setup-time placement into world space. Once the scene is built the live
/// position belongs to the physics body bound to this atom.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// 1-based serial number as it appears in the geometry table.
    pub serial: usize,
    pub element: Element,
    /// Rest position in atomic units.
    pub rest_position: Point3<f64>,
    /// Simulated mass. Zero pins the atom in place.
    pub mass: f64,
}

impl Atom {
    pub fn new(serial: usize, element: Element, rest_position: Point3<f64>, mass: f64) -> Self {
        Self {
            serial,
            element,
            rest_position,
            mass,
        }
    }

    /// A pivot atom has zero mass and is never moved by the physics world.
    #[inline]
    pub fn is_pivot(&self) -> bool {
        self.mass == 0.0
    }
}
