use crate::config::Config;
use color_eyre::eyre::{eyre, Result};
use nalgebra::Vector3;
use periodic_table_on_an_enum::Element;
use tracing::info;
use xctask::{Atom, Molecule};

/// Elements and the molecule built from the YAML geometry, in input order.
pub struct Geometry {
    pub elements: Vec<Element>,
    pub molecule: Molecule,
}

/// Build the molecular geometry defined in the YAML configuration.
pub fn build_geometry(config: &Config) -> Result<Geometry> {
    info!("Preparing geometry...");

    if config.geometry.is_empty() {
        return Err(eyre!("Configuration geometry contains no atoms"));
    }

    let mut elements = Vec::with_capacity(config.geometry.len());
    let mut atoms = Vec::with_capacity(config.geometry.len());

    for atom in &config.geometry {
        let element = Element::from_symbol(&atom.element)
            .ok_or_else(|| eyre!("Invalid element symbol: {}", atom.element))?;
        let coords = Vector3::new(atom.coords[0], atom.coords[1], atom.coords[2]);
        atoms.push(Atom::new(element.get_atomic_number() as u32, coords));
        elements.push(element);
    }

    info!("  {} atoms", atoms.len());
    Ok(Geometry {
        elements,
        molecule: Molecule::new(atoms),
    })
}
