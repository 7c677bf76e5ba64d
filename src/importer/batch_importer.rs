// ==========================================
// 批量导入引擎 - 批量导入管道
// ==========================================
// 职责: 驱动条目来源 → 构建草稿 → 唯一性检查 → 按批写入
// 状态机: Init → Streaming → (Accumulating → Flushing)* → Finalizing → Done
// 计数规则:
// - seen: 每个条目 +1
// - skipped: 空条目
// - processed: 通过检查并入批（写入失败也不回退）
// - errors: 条目级错误 + 写入失败的整批 + 批量写入的缺额
// 批次之间无事务，第 K 批失败不回滚前面已写入的批次
// ==========================================

use crate::config::import_config::{ImportRunConfig, OwnerSetting};
use crate::domain::mapping::CompiledMapping;
use crate::domain::resource::{ResourceDraft, ResourcePayload};
use crate::domain::run::{RunCounters, RunPhase, RunSummary};
use crate::domain::types::ResourceType;
use crate::engine::identifier_resolver::{IdentifierResolver, NormalizedIdentifier};
use crate::importer::entry::Entry;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::identity_checker::IdentityChecker;
use crate::importer::importer_trait::{BulkImporter, EntrySource};
use crate::importer::mapping_compiler::MappingCompiler;
use crate::importer::resource_builder::{BuildOutcome, ResourceBuilder};
use crate::perf::PerfGuard;
use crate::repository::identifier_repo::IdentifierRepository;
use crate::repository::metadata_repo::MetadataRepository;
use crate::repository::resource_repo::{BatchCreateOptions, ResourceWriteRepository};
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// PreparedRun - Init 阶段产物
// ==========================================
struct PreparedRun {
    mapping: CompiledMapping,
    prototype: ResourceDraft,
    builder: ResourceBuilder,
    checker: IdentityChecker,
    batch_size: usize,
}

/// 单个条目的处理结果
enum EntryOutcome {
    Skipped,
    Accepted(ResourcePayload),
    Rejected,
}

// ==========================================
// RunState - 单次运行的可变状态
// ==========================================
struct RunState {
    phase: RunPhase,
    counters: RunCounters,
    pending: Vec<ResourcePayload>,
    created_ids: Vec<i64>,
}

impl RunState {
    fn new() -> Self {
        Self {
            phase: RunPhase::Init,
            counters: RunCounters::default(),
            pending: Vec::new(),
            created_ids: Vec::new(),
        }
    }

    fn transition(&mut self, next: RunPhase) {
        if self.phase != next {
            debug!(from = %self.phase, to = %next, "运行阶段切换");
            self.phase = next;
        }
    }
}

// ==========================================
// BatchImporter - 批量导入管道
// ==========================================
pub struct BatchImporter {
    config: ImportRunConfig,
    metadata: Arc<dyn MetadataRepository>,
    resolver: Arc<IdentifierResolver>,
    sink: Arc<dyn ResourceWriteRepository>,
}

impl BatchImporter {
    /// 创建导入管道
    ///
    /// # 参数
    /// - config: 运行配置
    /// - metadata: 名称 → id 查询
    /// - identifiers: 标识符存储查询
    /// - sink: 资源写入端
    pub fn new(
        config: ImportRunConfig,
        metadata: Arc<dyn MetadataRepository>,
        identifiers: Arc<dyn IdentifierRepository>,
        sink: Arc<dyn ResourceWriteRepository>,
    ) -> Self {
        Self {
            config,
            metadata,
            resolver: Arc::new(IdentifierResolver::new(identifiers)),
            sink,
        }
    }

    pub fn config(&self) -> &ImportRunConfig {
        &self.config
    }

    // ==========================================
    // Init: 校验配置、规范化标识符名称、编译映射、构造原型
    // ==========================================
    async fn prepare(&self) -> ImportResult<PreparedRun> {
        self.config.validate()?;

        let identifiers = self.normalize_identifier_names().await?;

        let mapping = MappingCompiler::new(self.metadata.clone())
            .compile(&self.config.mapping)
            .await?;
        if mapping.is_empty() {
            warn!("映射表为空，所有非空条目将只携带默认值");
        }

        let owner_id = self.resolve_owner().await?;
        let template_id = match self.config.template.as_deref() {
            Some(value) => Some(
                self.metadata
                    .find_resource_template_id(value)
                    .await?
                    .ok_or_else(|| config_error("template", value, "资源模板不存在"))?,
            ),
            None => None,
        };
        let class_id = match self.config.class.as_deref() {
            Some(value) => Some(
                self.metadata
                    .find_resource_class_id(value)
                    .await?
                    .ok_or_else(|| config_error("class", value, "资源类不存在"))?,
            ),
            None => None,
        };

        let prototype = ResourceDraft::prototype(
            self.config.resource_type,
            owner_id,
            self.config.is_public,
            template_id,
            class_id,
        );

        let reference_kinds = identifiers.iter().map(|i| i.kind.clone()).collect();
        let builder = ResourceBuilder::new(self.resolver.clone(), self.metadata.clone(), reference_kinds);
        let checker = IdentityChecker::new(
            self.resolver.clone(),
            identifiers,
            self.config.duplicate_policy,
        );

        Ok(PreparedRun {
            mapping,
            prototype,
            builder,
            checker,
            batch_size: self.config.entries_by_batch,
        })
    }

    async fn normalize_identifier_names(&self) -> ImportResult<Vec<NormalizedIdentifier>> {
        let mut normalized = Vec::new();
        for name in &self.config.identifier_names {
            match IdentifierResolver::normalize_name(name, self.metadata.as_ref()).await? {
                Some(identifier) => normalized.push(identifier),
                None => warn!(identifier_name = %name, "标识符名称无效，忽略"),
            }
        }

        if normalized.is_empty() {
            error!(
                count = self.config.identifier_names.len(),
                "无有效标识符名称，不做重复检查"
            );
        }
        Ok(normalized)
    }

    async fn resolve_owner(&self) -> ImportResult<Option<i64>> {
        if self.config.owner.is_current() {
            return Ok(self.config.current_user_id);
        }

        let value = match &self.config.owner {
            OwnerSetting::Id(id) => id.to_string(),
            OwnerSetting::Named(name) => name.trim().to_string(),
        };
        match self.metadata.find_user_id(&value).await? {
            Some(id) => Ok(Some(id)),
            None => Err(config_error("owner", &value, "用户不存在")),
        }
    }

    // ==========================================
    // Streaming: 单条目构建 + 检查（条目级问题在此吸收）
    // ==========================================
    async fn process_entry(
        &self,
        prepared: &PreparedRun,
        entry: &Entry,
        separator: Option<&str>,
        index: usize,
    ) -> EntryOutcome {
        let outcome = prepared
            .builder
            .build(entry, &prepared.mapping, &prepared.prototype, separator, index)
            .await;

        let mut draft = match outcome {
            Ok(BuildOutcome::Skipped) => return EntryOutcome::Skipped,
            Ok(BuildOutcome::Built(draft)) => draft,
            Err(e) => {
                error!(index = index, error = %e, "条目构建失败");
                return EntryOutcome::Rejected;
            }
        };

        match prepared.checker.check(&mut draft, index).await {
            Ok(true) => EntryOutcome::Accepted(draft.into_payload()),
            Ok(false) => EntryOutcome::Rejected,
            Err(e) => {
                error!(index = index, error = %e, "标识符检查失败");
                EntryOutcome::Rejected
            }
        }
    }

    // ==========================================
    // Flushing: 提交累积的载荷（单条走 create_one，多条走 create_many）
    // ==========================================
    async fn flush(&self, state: &mut RunState, resource_type: ResourceType) {
        let mut batch = std::mem::take(&mut state.pending);
        let submitted = batch.len();
        if submitted == 0 {
            return;
        }
        state.transition(RunPhase::Flushing);

        let result = if submitted == 1 {
            match batch.pop() {
                Some(payload) => self
                    .sink
                    .create_one(resource_type, payload)
                    .await
                    .map(|created| vec![created]),
                None => Ok(Vec::new()),
            }
        } else {
            self.sink
                .create_many(resource_type, batch, BatchCreateOptions { continue_on_error: true })
                .await
        };

        match result {
            Ok(created) => {
                let shortfall = submitted.saturating_sub(created.len());
                if shortfall > 0 {
                    warn!(
                        resource_type = %resource_type,
                        submitted = submitted,
                        created = created.len(),
                        "批量写入部分失败"
                    );
                    state.counters.errors += shortfall;
                }
                for resource in created {
                    info!(
                        resource_type = resource.resource_type.label(),
                        resource_id = resource.id,
                        "已创建资源"
                    );
                    state.created_ids.push(resource.id);
                }
            }
            Err(e) => {
                error!(
                    resource_type = %resource_type,
                    submitted = submitted,
                    error = %e,
                    "写入端核心错误，整批计为错误"
                );
                state.counters.errors += submitted;
            }
        }
    }
}

#[async_trait]
impl BulkImporter for BatchImporter {
    #[instrument(skip(self, source), fields(resource_type = %self.config.resource_type))]
    async fn run(&self, source: &mut dyn EntrySource) -> ImportResult<RunSummary> {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let mut perf = PerfGuard::new("import_run", run_id.clone());
        let resource_type = self.config.resource_type;

        info!(run_id = %run_id, resource_type = %resource_type, "开始导入运行");

        let mut state = RunState::new();
        let prepared = self.prepare().await?;
        let separator = source
            .separator()
            .or(self.config.separator())
            .map(str::to_string);

        state.transition(RunPhase::Streaming);
        while let Some(entry) = source.next_entry() {
            state.counters.seen += 1;
            let index = state.counters.seen;
            info!(index = index, "处理资源条目");

            match self
                .process_entry(&prepared, &entry, separator.as_deref(), index)
                .await
            {
                EntryOutcome::Skipped => {
                    state.counters.skipped += 1;
                    warn!(index = index, "空条目，跳过");
                }
                EntryOutcome::Accepted(payload) => {
                    state.counters.processed += 1;
                    state.transition(RunPhase::Accumulating);
                    state.pending.push(payload);
                }
                EntryOutcome::Rejected => state.counters.errors += 1,
            }

            if state.pending.len() >= prepared.batch_size {
                self.flush(&mut state, resource_type).await;
                perf.record_flush();
                state.transition(RunPhase::Streaming);
            }
        }

        state.transition(RunPhase::Finalizing);
        if !state.pending.is_empty() {
            self.flush(&mut state, resource_type).await;
            perf.record_flush();
        }
        state.transition(RunPhase::Done);

        let counters = state.counters;
        perf.record_entries(counters.seen);
        info!(
            run_id = %run_id,
            resource_type = %resource_type,
            seen = counters.seen,
            skipped = counters.skipped,
            processed = counters.processed,
            errors = counters.errors,
            "导入运行结束"
        );

        Ok(RunSummary {
            run_id,
            resource_type,
            counters,
            created_ids: state.created_ids,
            started_at,
            finished_at: Utc::now(),
            elapsed_ms: perf.elapsed_ms(),
        })
    }

    async fn import_file(&self, file_path: &Path) -> ImportResult<RunSummary> {
        let separator = self.config.separator().map(str::to_string);
        let mut source = UniversalFileParser.open(file_path, separator)?;
        info!(file = %file_path.display(), entries = source.remaining(), "文件解析完成");
        self.run(&mut source).await
    }

    async fn import_files(&self, file_paths: Vec<PathBuf>) -> Vec<ImportResult<RunSummary>> {
        info!(count = file_paths.len(), "开始依次导入文件");

        let results: Vec<ImportResult<RunSummary>> = stream::iter(file_paths)
            .then(|path| async move {
                let result = self.import_file(&path).await;
                if let Err(e) = &result {
                    error!(file = %path.display(), error = %e, "文件导入失败");
                }
                result
            })
            .collect()
            .await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "文件导入完成"
        );
        results
    }
}

fn config_error(key: &str, value: &str, message: &str) -> ImportError {
    ImportError::ConfigValueError {
        key: key.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}
