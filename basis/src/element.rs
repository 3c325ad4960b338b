/* Per-element basis definitions read from NWChem formatted text,
   as served by the Basis Set Exchange.

   Author: Victor Zhang
*/

use crate::error::{BasisError, Result};
use crate::shell::Primitive;
use periodic_table_on_an_enum::Element;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A contracted shell before it is placed on an atom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellTemplate {
    pub l: u32,
    pub primitives: Vec<Primitive>,
}

/// All shells defined for one element, in file order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementBasis {
    pub symbol: String,
    pub atomic_number: u32,
    pub shells: Vec<ShellTemplate>,
}

fn angular_momentum(label: &str) -> Option<u32> {
    match label {
        "S" => Some(0),
        "P" => Some(1),
        "D" => Some(2),
        "F" => Some(3),
        "G" => Some(4),
        "H" => Some(5),
        _ => None,
    }
}

fn is_shell_label(token: &str) -> bool {
    token == "SP" || angular_momentum(token).is_some()
}

impl ElementBasis {
    // Example of nwchem format:
    // BASIS "ao basis" SPHERICAL PRINT
    // #BASIS SET: (10s,4p) -> [3s,2p]
    // C    S
    //       0.3047524880E+04       0.1834737132E-02
    //       ...
    // C    SP
    //       0.7868272350E+01      -0.1193324198E+00       0.6899906659E-01
    //       ...
    // END
    //
    // An SP block carries one exponent column and two coefficient columns;
    // it is split into an S shell and a P shell sharing exponents.
    fn parse_primitive_block(
        rows: &[(usize, &str)],
        label: &str,
        label_line: usize,
    ) -> Result<Vec<ShellTemplate>> {
        let ls: Vec<u32> = if label == "SP" {
            vec![0, 1]
        } else {
            let l = angular_momentum(label).ok_or_else(|| BasisError::UnsupportedShell {
                line: label_line,
                label: label.to_string(),
            })?;
            vec![l]
        };

        let mut res: Vec<ShellTemplate> = ls
            .iter()
            .map(|&l| ShellTemplate {
                l,
                primitives: Vec::new(),
            })
            .collect();

        for &(line_no, line) in rows {
            let numbers = line
                .split_whitespace()
                .map(|tok| tok.replace(['D', 'd'], "E").parse::<f64>())
                .collect::<std::result::Result<Vec<f64>, _>>()
                .map_err(|_| BasisError::Parse {
                    line: line_no,
                    text: line.to_string(),
                })?;
            if numbers.len() < 1 + res.len() {
                return Err(BasisError::Parse {
                    line: line_no,
                    text: line.to_string(),
                });
            }

            let alpha = numbers[0];
            for (shell, &coeff) in res.iter_mut().zip(&numbers[1..]) {
                shell.primitives.push(Primitive::new(alpha, coeff));
            }
        }

        Ok(res)
    }

    /// Parses NWChem text holding the basis of a single element.
    pub fn parse_nwchem(input: &str) -> Result<Self> {
        let mut symbol: Option<String> = None;
        let mut shells = Vec::new();

        let mut current_block: Vec<(usize, &str)> = Vec::new();
        let mut current_label: Option<(String, usize)> = None;

        for (idx, line) in input.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens[0].eq_ignore_ascii_case("BASIS") || tokens[0].eq_ignore_ascii_case("END") {
                continue;
            }

            if tokens[0].chars().all(char::is_alphabetic) {
                if tokens.len() < 2 || !is_shell_label(&tokens[1].to_uppercase()) {
                    return Err(BasisError::UnsupportedShell {
                        line: line_no,
                        label: tokens.get(1).unwrap_or(&"").to_string(),
                    });
                }

                match &symbol {
                    None => symbol = Some(tokens[0].to_string()),
                    Some(first) if !first.eq_ignore_ascii_case(tokens[0]) => {
                        return Err(BasisError::MixedElements {
                            first: first.clone(),
                            second: tokens[0].to_string(),
                        });
                    }
                    Some(_) => {}
                }

                // Process previous block if it exists
                if let Some((label, label_line)) = current_label.take() {
                    shells.extend(Self::parse_primitive_block(&current_block, &label, label_line)?);
                }
                current_block.clear();
                current_label = Some((tokens[1].to_uppercase(), line_no));
            } else if current_label.is_some() {
                current_block.push((line_no, line));
            } else {
                return Err(BasisError::Parse {
                    line: line_no,
                    text: line.to_string(),
                });
            }
        }

        // Process the last block
        if let Some((label, label_line)) = current_label.take() {
            shells.extend(Self::parse_primitive_block(&current_block, &label, label_line)?);
        }

        let symbol = symbol.ok_or_else(|| BasisError::EmptyBasis(String::new()))?;
        let element = Element::from_symbol(&symbol)
            .ok_or_else(|| BasisError::UnknownElement(symbol.clone()))?;
        if shells.iter().all(|s| s.primitives.is_empty()) {
            return Err(BasisError::EmptyBasis(symbol));
        }

        Ok(ElementBasis {
            symbol: element.get_symbol().to_string(),
            atomic_number: element.get_atomic_number() as u32,
            shells,
        })
    }

    pub fn load_nwchem<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| BasisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_nwchem(&text)
    }
}
