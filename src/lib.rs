//! Utilities for computational neuroscience model workflows.
//!
//! Two areas of functionality:
//!
//! - Packaging: resolve the dependency closure of a NeuroML/LEMS model file
//!   ([`resolver`]), generate a COMBINE manifest and bundle everything into a
//!   COMBINE/OMEX zip archive ([`generator`]).
//! - Debugging: introspect compiled NEURON morphology and mechanism state
//!   through the external `nrniv` interpreter ([`neuron`]).
//!
//! The binary `nmlpack` exposes both as subcommands.

pub mod generator;
pub mod model;
pub mod neuron;
pub mod resolver;
