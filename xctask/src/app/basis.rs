use crate::config::BasisParams;
use crate::io::{basis_file_path, read_element_basis};
use ::basis::{BasisLibrary, ElementBasis};
use color_eyre::eyre::{eyre, Result};
use periodic_table_on_an_enum::Element;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

/// Source of per-element basis definitions.
pub trait BasisLoader {
    fn load(&self, element: &Element) -> Result<ElementBasis>;
}

/// Reads NWChem files, either listed per element or found by name in a
/// directory.
pub struct NwchemFileLoader {
    name: String,
    directory: String,
    files: HashMap<String, String>,
}

impl NwchemFileLoader {
    pub fn from_params(params: &BasisParams) -> Self {
        Self {
            name: params.name.clone().unwrap_or_else(|| "sto-3g".to_string()),
            directory: params.directory.clone().unwrap_or_else(|| ".".to_string()),
            files: params.files.clone().unwrap_or_default(),
        }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        match self.files.get(symbol) {
            Some(file) => PathBuf::from(file),
            None => basis_file_path(&self.directory, &self.name, symbol),
        }
    }
}

impl BasisLoader for NwchemFileLoader {
    fn load(&self, element: &Element) -> Result<ElementBasis> {
        let symbol = element.get_symbol();
        let path = self.path_for(symbol);
        info!("Loading basis for {} from {}", symbol, path.display());

        let basis = read_element_basis(&path)?;
        if basis.atomic_number != element.get_atomic_number() as u32 {
            return Err(eyre!(
                "Basis file {} describes {}, expected {}",
                path.display(),
                basis.symbol,
                symbol
            ));
        }
        Ok(basis)
    }
}

/// Collects one basis definition per distinct element.
pub struct BasisRegistry<L: BasisLoader> {
    loader: L,
    library: BasisLibrary,
}

impl<L: BasisLoader> BasisRegistry<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            library: BasisLibrary::new(),
        }
    }

    pub fn load_for_elements(&mut self, elements: &[Element]) -> Result<&BasisLibrary> {
        for element in elements {
            if self.library.contains(element.get_atomic_number() as u32) {
                continue;
            }
            let basis = self.loader.load(element)?;
            self.library.insert(basis);
        }
        Ok(&self.library)
    }
}
