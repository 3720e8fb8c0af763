//! Whole-unit expansion: find annotated declarations, transform them, splice the result.
use log::{debug, info};

use crate::{
    config::Config,
    diagnostics::{Diagnostic, DiagnosticSink, apply_fixes},
    emit::GeneratedArtifact,
    error::{Error, Result},
    pass::{PassContext, annotation},
    render::Renderer,
    syntax::{
        ast::{Item, PropertyDecl},
        indentation_at, parse_unit,
    },
};

/// Result of expanding a compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// The unit with every successfully transformed declaration replaced.
    pub source: String,
    /// Artifacts in source order.
    pub artifacts: Vec<GeneratedArtifact>,
    /// Diagnostics ordered by source location.
    pub diagnostics: Vec<Diagnostic>,
}

impl Expansion {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

fn collect_properties<'u>(items: &'u [Item], out: &mut Vec<&'u PropertyDecl>) {
    for item in items {
        match item {
            Item::Property(decl) => out.push(decl),
            Item::Container(container) => collect_properties(&container.items, out),
            Item::Other(_) => {}
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Expander {
    config: Config,
}

impl Expander {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Transform every annotated declaration of the unit.
    ///
    /// Declarations that fail keep their original text; their diagnostic is returned
    /// alongside the expanded source.
    pub fn expand(&self, source: &str) -> Result<Expansion> {
        let unit = parse_unit(source)?;
        let mut decls = Vec::new();
        collect_properties(&unit.items, &mut decls);
        decls.retain(|decl| annotation(&self.config, decl).is_some());

        let sink = DiagnosticSink::new();
        let results = self.run_all(source, &decls, &sink)?;

        let renderer = Renderer::new(&self.config);
        let mut output = String::with_capacity(source.len() * 2);
        let mut cursor = 0;
        let mut artifacts = Vec::new();
        for (decl, artifact) in decls.iter().zip(results) {
            let Some(artifact) = artifact else { continue };
            let indent = indentation_at(source, decl.span.start);
            output.push_str(&source[cursor..decl.span.start]);
            for (n, line) in renderer.render(&artifact).lines().enumerate() {
                if n > 0 {
                    output.push('\n');
                    if !line.is_empty() {
                        output.push_str(indent);
                    }
                }
                output.push_str(line);
            }
            cursor = decl.span.end;
            artifacts.push(artifact);
        }
        output.push_str(&source[cursor..]);

        let diagnostics = sink.into_sorted();
        info!(
            "Expanded {} of {} annotated declaration(s), {} diagnostic(s)",
            artifacts.len(),
            decls.len(),
            diagnostics.len()
        );
        Ok(Expansion {
            source: output,
            artifacts,
            diagnostics,
        })
    }

    /// Diagnostics of the unit, without producing any code.
    pub fn check(&self, source: &str) -> Result<Vec<Diagnostic>> {
        Ok(self.expand(source)?.diagnostics)
    }

    /// Apply every available fix-it to the unit.
    pub fn fix(&self, source: &str) -> Result<String> {
        let diagnostics = self.check(source)?;
        apply_fixes(source, &diagnostics)
    }

    fn run_all(
        &self,
        source: &str,
        decls: &[&PropertyDecl],
        sink: &DiagnosticSink,
    ) -> Result<Vec<Option<GeneratedArtifact>>> {
        let context = PassContext::new(&self.config, source, sink);
        if !self.config.parallel || decls.len() < 2 {
            return Ok(decls.iter().map(|decl| context.run(decl)).collect());
        }

        let workers = std::thread::available_parallelism()
            .map_or(1, |n| n.get())
            .min(decls.len());
        let chunk_size = decls.len().div_ceil(workers);
        debug!(
            "Expanding {} declaration(s) on {workers} worker(s)",
            decls.len()
        );

        let chunks = crossbeam::scope(|scope| -> Result<Vec<Vec<Option<GeneratedArtifact>>>> {
            let context = &context;
            let handles = decls
                .chunks(chunk_size)
                .enumerate()
                .map(|(index, chunk)| {
                    scope
                        .builder()
                        .name(format!("stubgen-worker-{index}"))
                        .spawn(move |_| {
                            chunk
                                .iter()
                                .map(|decl| context.run(decl))
                                .collect::<Vec<_>>()
                        })
                })
                .collect::<std::io::Result<Vec<_>>>()?;
            handles
                .into_iter()
                .map(|handle| handle.join().map_err(|_| Error::WorkerPanicked))
                .collect()
        })
        .map_err(|_| Error::WorkerPanicked)??;
        Ok(chunks.into_iter().flatten().collect())
    }
}
