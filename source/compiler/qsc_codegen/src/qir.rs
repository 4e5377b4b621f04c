// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub mod catalog;
mod diagnostics;
mod emit;
mod error;
mod module_builder;
mod output;
mod resources;
mod verify;


pub use diagnostics::{Artifact, ArtifactDirectory, DiagnosticSink};
pub use error::{Error, LayoutIssue, Reference};
pub use module_builder::ModuleBuilder;
pub use resources::Resources;

use log::{debug, warn};
use qsc_circuit::NormalizedCircuit;
use qsc_data_structures::target::Profile;
use qsc_llvm::{Module, bitcode, text};
use serde::{Deserialize, Serialize};

/// Options controlling how a circuit is lowered to QIR.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QirOptions {
    /// The profile recorded in the `qir_profiles` entry point attribute.
    pub profile: Profile,
    /// Whether to append output recording calls for the classical registers.
    pub record_output: bool,
    /// Whether barriers lower to `__quantum__qis__barrier__body` instead of nothing.
    pub emit_barrier_calls: bool,
    /// Entry point name. Defaults to the circuit name.
    pub entry_point: Option<String>,
}

impl Default for QirOptions {
    fn default() -> Self {
        Self {
            profile: Profile::Base,
            record_output: true,
            emit_barrier_calls: false,
            entry_point: None,
        }
    }
}

/// A verified QIR module together with its text and bitcode renderings.
#[derive(Clone, Debug)]
pub struct QirModule {
    module: Module,
    text: String,
    binary: Vec<u8>,
    resources: Resources,
}

impl QirModule {
    #[must_use]
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// The module as LLVM textual IR.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The module as LLVM bitcode, see [`qsc_llvm::bitcode`].
    #[must_use]
    pub fn binary(&self) -> &[u8] {
        &self.binary
    }

    #[must_use]
    pub fn resources(&self) -> Resources {
        self.resources
    }

    #[must_use]
    pub fn entry_point(&self) -> &str {
        self.module
            .functions
            .first()
            .map_or("", |func| func.name.as_str())
    }
}

/// Converts the given circuit to QIR.
pub fn circuit_to_qir(circuit: &NormalizedCircuit, options: &QirOptions) -> Result<QirModule, Error> {
    let resources = resources::account(circuit)?;
    let name = entry_point_name(circuit, options);

    let mut builder = ModuleBuilder::new(name.clone(), name);
    emit::emit_operations(circuit, options, &mut builder)?;
    if options.record_output && resources.required_results > 0 {
        output::record_output(circuit, &mut builder);
    }
    let module = builder.finish(resources, options.profile);
    verify::verify_module(&module, resources)?;

    let text = text::write_module(&module);
    let binary = bitcode::write_module(&module);
    verify::check_parity(&module, &text, &binary)?;
    debug!(
        "generated `{}`: {} declarations, {} instructions, {} bytes",
        module.source_name,
        module.declarations.len(),
        module.instruction_count(),
        binary.len()
    );

    Ok(QirModule {
        module,
        text,
        binary,
        resources,
    })
}

/// Converts the given circuit to QIR, handing the input and both renderings to `sink`.
///
/// The circuit is persisted before translation starts so it is available even when
/// translation fails. Sink failures are logged and otherwise ignored.
pub fn circuit_to_qir_with_diagnostics(
    circuit: &NormalizedCircuit,
    options: &QirOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<QirModule, Error> {
    let name = entry_point_name(circuit, options);
    match circuit.to_json() {
        Ok(json) => persist(sink, &name, Artifact::Circuit(&json)),
        Err(e) => warn!("could not serialize circuit `{name}`: {e}"),
    }

    let qir = circuit_to_qir(circuit, options)?;
    persist(sink, &name, Artifact::Text(qir.text()));
    persist(sink, &name, Artifact::Binary(qir.binary()));
    Ok(qir)
}

fn persist(sink: &mut dyn DiagnosticSink, name: &str, artifact: Artifact<'_>) {
    if let Err(e) = sink.persist(name, artifact) {
        warn!("could not persist {name}.{}: {e}", artifact.extension());
    }
}

/// The entry point name for a circuit: the configured name, else the circuit name,
/// restricted to characters valid in an unquoted LLVM identifier.
#[must_use]
pub fn entry_point_name(circuit: &NormalizedCircuit, options: &QirOptions) -> String {
    let raw = options.entry_point.as_deref().unwrap_or(&circuit.name);
    let mut name = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>();
    if name.is_empty() {
        name = "main".to_string();
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}
