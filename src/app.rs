//! Application wiring for drugcache
//!
//! This module owns the run's transport, cache and endpoints, resolves the
//! entities named on the command line and dispatches each subcommand to its
//! source.

use tracing::{debug, info};

use crate::cache::{CacheManager, CacheOutcome};
use crate::cli::{ChemblArgs, Command, GgetArgs, NcatsArgs, OpenTargetsArgs, StartupConfig};
use crate::client::{Endpoints, HttpTransport, Transport};
use crate::resolve::{CompoundLookup, GeneLookup};
use crate::sources::{
    self, ChemblRequest, GgetRequest, NcatsRequest, OpenTargetsRequest, SourceContext, SourceError,
};

/// Main application struct holding everything a run needs
pub struct App {
    config: StartupConfig,
    transport: Box<dyn Transport>,
    cache: CacheManager,
    endpoints: Endpoints,
}

impl App {
    /// Creates an App that talks to the public APIs over HTTP
    pub fn new(config: StartupConfig) -> Result<Self, SourceError> {
        let transport = HttpTransport::new()?;
        Ok(Self::with_transport(config, Box::new(transport)))
    }

    /// Creates an App with a custom transport (used for testing)
    pub fn with_transport(config: StartupConfig, transport: Box<dyn Transport>) -> Self {
        let cache = CacheManager::with_dir(config.results_dir.clone()).with_force(config.force);
        Self {
            config,
            transport,
            cache,
            endpoints: Endpoints::default(),
        }
    }

    /// Replaces the API endpoints
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn config(&self) -> &StartupConfig {
        &self.config
    }

    fn context(&self) -> SourceContext<'_> {
        SourceContext::new(self.transport.as_ref(), &self.cache, &self.endpoints)
    }

    /// Gene table, read from disk only when `known` rejects the built-ins
    fn gene_lookup(&self, known: impl Fn(&GeneLookup) -> bool) -> Result<GeneLookup, SourceError> {
        let builtin = GeneLookup::builtin();
        if known(&builtin) {
            return Ok(builtin);
        }
        debug!("Loading gene table {}", self.config.gene_table.display());
        Ok(GeneLookup::load(&self.config.gene_table)?)
    }

    fn resolve_gene_id(&self, symbol: &str) -> Result<String, SourceError> {
        let lookup = self.gene_lookup(|l| l.contains_symbol(symbol))?;
        Ok(lookup.resolve_gene_id(symbol, self.config.ambiguity)?)
    }

    fn resolve_gene_symbol(&self, id: &str) -> Result<String, SourceError> {
        let lookup = self.gene_lookup(|l| l.contains_id(id))?;
        Ok(lookup.resolve_gene_symbol(id, self.config.ambiguity)?)
    }

    fn resolve_unii(&self, name: &str) -> Result<String, SourceError> {
        let builtin = CompoundLookup::builtin();
        let lookup = if builtin.contains(name) {
            builtin
        } else {
            debug!("Loading compound table {}", self.config.compound_table.display());
            CompoundLookup::load(&self.config.compound_table)?
        };
        Ok(lookup.resolve_unii(name, self.config.ambiguity)?)
    }

    /// Runs one subcommand and reports what each step did
    pub async fn run(&self, command: &Command) -> Result<Vec<CacheOutcome>, SourceError> {
        match command {
            Command::Chembl(args) => self.run_chembl(args).await,
            Command::OpenTargets(args) => self.run_open_targets(args).await,
            Command::Gget(args) => self.run_gget(args).await,
            Command::Ncats(args) => self.run_ncats(args).await,
            Command::All => {
                let mut outcomes = self.run_chembl(&ChemblArgs::default()).await?;
                outcomes.extend(self.run_open_targets(&OpenTargetsArgs::default()).await?);
                outcomes.extend(self.run_gget(&GgetArgs::default()).await?);
                outcomes.extend(self.run_ncats(&NcatsArgs::default()).await?);
                Ok(outcomes)
            }
        }
    }

    async fn run_chembl(&self, args: &ChemblArgs) -> Result<Vec<CacheOutcome>, SourceError> {
        let gene_symbol = args.gene_symbol.to_uppercase();
        let request = ChemblRequest {
            gene_id: self.resolve_gene_id(&gene_symbol)?,
            gene_symbol,
            drug_id: args.drug_id.clone(),
            drug_name: args.drug_name.clone(),
        };
        info!("Running ChEMBL for {} ({})", request.gene_symbol, request.gene_id);
        sources::chembl::run(self.context(), &request).await
    }

    async fn run_open_targets(
        &self,
        args: &OpenTargetsArgs,
    ) -> Result<Vec<CacheOutcome>, SourceError> {
        let gene_symbol = args.gene_symbol.to_uppercase();
        let request = OpenTargetsRequest {
            gene_id: self.resolve_gene_id(&gene_symbol)?,
            gene_symbol,
            disease_id: args.disease_id.clone(),
            disease_name: args.disease_name.clone(),
            drug_id: args.drug_id.clone(),
            drug_name: args.drug_name.clone(),
        };
        info!("Running Open Targets for {} ({})", request.gene_symbol, request.gene_id);
        sources::open_targets::run(self.context(), &request).await
    }

    async fn run_gget(&self, args: &GgetArgs) -> Result<Vec<CacheOutcome>, SourceError> {
        let request = GgetRequest {
            gene_symbol: self.resolve_gene_symbol(&args.gene_id)?,
            gene_id: args.gene_id.clone(),
        };
        info!("Running gget for {} ({})", request.gene_symbol, request.gene_id);
        sources::gget::run(self.context(), &request).await
    }

    async fn run_ncats(&self, args: &NcatsArgs) -> Result<Vec<CacheOutcome>, SourceError> {
        let compound_name = args.compound_name.to_uppercase();
        let request = NcatsRequest {
            unii: self.resolve_unii(&compound_name)?,
            compound_name,
            data_dir: self.config.data_dir.clone(),
        };
        info!("Running NCATS for {} ({})", request.compound_name, request.unii);
        sources::ncats::run(self.context(), &request).await
    }
}
