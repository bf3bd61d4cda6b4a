//! Hand-authored primitive gates.

use crate::gate::{metadata_key, Gate, Metadata};
use anyhow::{bail, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombUnitary {
    Buf,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombBinary {
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Xnor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    CombUnitary(CombUnitary),
    CombBinary(CombBinary),
}

impl std::str::FromStr for Primitive {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use CombBinary::*;
        use CombUnitary::*;
        Ok(match s {
            "BUFFER" | "BUF" => Self::CombUnitary(Buf),
            "NOT" => Self::CombUnitary(Not),
            "AND" => Self::CombBinary(And),
            "NAND" => Self::CombBinary(Nand),
            "OR" => Self::CombBinary(Or),
            "NOR" => Self::CombBinary(Nor),
            "XOR" => Self::CombBinary(Xor),
            "XNOR" => Self::CombBinary(Xnor),
            _ => bail!("'{}' is not a primitive gate.", s),
        })
    }
}

impl Primitive {
    pub const ALL: [Primitive; 8] = [
        Primitive::CombUnitary(CombUnitary::Buf),
        Primitive::CombUnitary(CombUnitary::Not),
        Primitive::CombBinary(CombBinary::And),
        Primitive::CombBinary(CombBinary::Nand),
        Primitive::CombBinary(CombBinary::Or),
        Primitive::CombBinary(CombBinary::Nor),
        Primitive::CombBinary(CombBinary::Xor),
        Primitive::CombBinary(CombBinary::Xnor),
    ];

    pub fn is_primitive(s: impl AsRef<str>) -> bool {
        s.as_ref().parse::<Primitive>().is_ok()
    }
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::CombUnitary(CombUnitary::Buf) => "BUFFER",
            Primitive::CombUnitary(CombUnitary::Not) => "NOT",
            Primitive::CombBinary(CombBinary::And) => "AND",
            Primitive::CombBinary(CombBinary::Nand) => "NAND",
            Primitive::CombBinary(CombBinary::Or) => "OR",
            Primitive::CombBinary(CombBinary::Nor) => "NOR",
            Primitive::CombBinary(CombBinary::Xor) => "XOR",
            Primitive::CombBinary(CombBinary::Xnor) => "XNOR",
        }
    }
    pub fn input_names(&self) -> &'static [&'static str] {
        match self {
            Primitive::CombUnitary(_) => &["A"],
            Primitive::CombBinary(_) => &["A", "B"],
        }
    }
    /// Editor color.
    pub fn color(&self) -> &'static str {
        match self {
            Primitive::CombUnitary(CombUnitary::Buf) => "#9e9e9e",
            Primitive::CombUnitary(CombUnitary::Not) => "#faae3c",
            Primitive::CombBinary(CombBinary::And) => "#eb4034",
            Primitive::CombBinary(CombBinary::Nand) => "#b3261e",
            Primitive::CombBinary(CombBinary::Or) => "#3c8bfa",
            Primitive::CombBinary(CombBinary::Nor) => "#1f5fbf",
            Primitive::CombBinary(CombBinary::Xor) => "#8e3cfa",
            Primitive::CombBinary(CombBinary::Xnor) => "#5e1fb3",
        }
    }
    pub fn eval(&self, inputs: &[bool]) -> bool {
        match *self {
            Primitive::CombUnitary(op) => op.eval(inputs[0]),
            Primitive::CombBinary(op) => op.eval(inputs[0], inputs[1]),
        }
    }
    /// Build the gate type for this primitive.
    pub fn gate(self) -> Gate {
        let mut metadata = Metadata::new();
        metadata.insert(metadata_key::COLOR.to_owned(), self.color().into());
        Gate::primitive(
            self.name(),
            self.input_names().iter().copied(),
            ["X"],
            move |inputs| vec![self.eval(inputs)],
        )
        .with_metadata(metadata)
    }
}

impl CombUnitary {
    pub fn eval(&self, op: bool) -> bool {
        match self {
            CombUnitary::Buf => op,
            CombUnitary::Not => !op,
        }
    }
}

impl CombBinary {
    pub fn eval(&self, op0: bool, op1: bool) -> bool {
        match self {
            CombBinary::And => op0 & op1,
            CombBinary::Nand => !(op0 & op1),
            CombBinary::Or => op0 | op1,
            CombBinary::Nor => !(op0 | op1),
            CombBinary::Xor => op0 ^ op1,
            CombBinary::Xnor => !(op0 ^ op1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for prim in Primitive::ALL {
            assert_eq!(prim.name().parse::<Primitive>().unwrap(), prim);
        }
        assert!(Primitive::is_primitive("BUF"));
        assert!(!Primitive::is_primitive("FULL ADDER"));
    }

    #[test]
    fn or_gate_truth_table() {
        let or = Primitive::CombBinary(CombBinary::Or).gate();
        assert_eq!(or.evaluate(&[false, false]).unwrap(), vec![false]);
        assert_eq!(or.evaluate(&[true, false]).unwrap(), vec![true]);
        assert_eq!(or.evaluate(&[false, true]).unwrap(), vec![true]);
        assert_eq!(or.evaluate(&[true, true]).unwrap(), vec![true]);
        assert_eq!(or.color(), Some("#3c8bfa"));
    }

    #[test]
    fn binary_ops() {
        assert!(CombBinary::Nand.eval(true, false));
        assert!(!CombBinary::Nor.eval(true, false));
        assert!(CombBinary::Xnor.eval(true, true));
        assert!(!CombUnitary::Not.eval(true));
    }
}
