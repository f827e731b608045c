// ==========================================
// FuelEU 合规系统 - 航线 API
// ==========================================
// 职责: 航线查询、基线设置、基线对比、航线录入
// 基线: 全系统至多一条（baseline_marker 单行表）
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use crate::api::dto::{ComparisonRoute, RouteComparisonResult, RouteInput};
use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{configured_year_range, validate_year};
use crate::config::ComplianceConfigReader;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::ids::IdGenerator;
use crate::domain::route::{Route, RouteFilter};
use crate::engine::comparison::{meets_target, percent_diff};
use crate::repository::{ActionLogRepository, RouteRepository, UnitOfWork};

// ==========================================
// RouteApi - 航线 API
// ==========================================
pub struct RouteApi {
    route_repo: Arc<RouteRepository>,
    config: Arc<dyn ComplianceConfigReader>,
    unit_of_work: Arc<UnitOfWork>,
    ids: Arc<dyn IdGenerator>,
    actor: String,
}

impl RouteApi {
    pub fn new(
        route_repo: Arc<RouteRepository>,
        config: Arc<dyn ComplianceConfigReader>,
        unit_of_work: Arc<UnitOfWork>,
        ids: Arc<dyn IdGenerator>,
        actor: &str,
    ) -> Self {
        Self {
            route_repo,
            config,
            unit_of_work,
            ids,
            actor: actor.to_string(),
        }
    }

    /// 按条件查询航线（条件为空时返回全部）
    pub fn get_routes(&self, filter: &RouteFilter) -> ApiResult<Vec<Route>> {
        if let Some(year) = filter.year {
            validate_year(year, configured_year_range(self.config.as_ref())?)?;
        }
        if filter.is_empty() {
            return Ok(self.route_repo.find_all()?);
        }
        Ok(self.route_repo.find_by_filter(filter)?)
    }

    /// 按航线编号（或内部ID）查询
    pub fn get_route(&self, route_ref: &str) -> ApiResult<Route> {
        let route_ref = route_ref.trim();
        if route_ref.is_empty() {
            return Err(ApiError::ValidationError("航线编号不能为空".to_string()));
        }
        if let Some(route) = self.route_repo.find_by_code(route_ref)? {
            return Ok(route);
        }
        self.route_repo
            .find_by_id(route_ref)?
            .ok_or_else(|| ApiError::NotFound(format!("航线不存在: {}", route_ref)))
    }

    /// 设置基线航线
    ///
    /// # 参数
    /// - route_ref: 航线编号（如 R001）或内部ID
    ///
    /// # 返回
    /// - Ok(Route): 更新后的基线航线
    /// - Err(NotFound): 航线不存在（原基线保持不变）
    #[instrument(skip(self))]
    pub fn set_baseline(&self, route_ref: &str) -> ApiResult<Route> {
        let target = self.get_route(route_ref)?;

        let route = self.unit_of_work.run(|conn| -> ApiResult<Route> {
            let previous = RouteRepository::find_baseline_tx(conn)?;
            let route = RouteRepository::set_baseline_tx(conn, &target.id, Utc::now())?;

            let log = ActionLog::new(self.ids.next_id(), ActionType::SetBaseline, &self.actor)
                .with_scope(route.ship_id(), route.year)
                .with_payload(&serde_json::json!({
                    "routeCode": route.route_code,
                    "previousRouteCode": previous.map(|r| r.route_code),
                }));
            ActionLogRepository::insert_tx(conn, &log)?;
            Ok(route)
        })?;

        info!(route_code = %route.route_code, "基线航线已设置");
        Ok(route)
    }

    /// 基线对比
    ///
    /// # 返回
    /// - Ok(RouteComparisonResult): 基线航线 + 其余航线的百分比差异与达标标记
    /// - Err(NotFound): 尚未设置基线
    ///
    /// # 说明
    /// 目标强度取配置的对比年度（默认 2025）
    pub fn get_comparison(&self) -> ApiResult<RouteComparisonResult> {
        let baseline = self
            .route_repo
            .find_baseline()?
            .ok_or_else(|| ApiError::NotFound("尚未设置基线航线".to_string()))?;

        let reference_year = self
            .config
            .get_comparison_reference_year()
            .map_err(ApiError::from_config)?;
        let calculator = self.config.load_calculator().map_err(ApiError::from_config)?;
        let target_intensity = calculator.target_intensity(reference_year);

        let mut comparison_routes = Vec::new();
        for route in self.route_repo.find_all()? {
            if route.id == baseline.id {
                continue;
            }
            let diff = percent_diff(baseline.ghg_intensity, route.ghg_intensity)?;
            let compliant = meets_target(route.ghg_intensity, target_intensity);
            comparison_routes.push(ComparisonRoute {
                route,
                percent_diff: diff,
                compliant,
            });
        }

        Ok(RouteComparisonResult {
            baseline_route: baseline,
            comparison_routes,
            target_intensity,
            reference_year,
        })
    }

    /// 录入航线
    ///
    /// # 返回
    /// - Err(ValidationError): 字段校验失败或航线编号重复
    #[instrument(skip(self, input), fields(route_code = %input.route_code))]
    pub fn create_route(&self, input: RouteInput) -> ApiResult<Route> {
        let years = configured_year_range(self.config.as_ref())?;
        let now = Utc::now();
        let route = input.into_route(self.ids.next_id(), now, now);
        route
            .validate_within(years.min, years.max)
            .map_err(ApiError::ValidationError)?;

        if self.route_repo.find_by_code(&route.route_code)?.is_some() {
            return Err(ApiError::ValidationError(format!(
                "航线编号已存在: {}",
                route.route_code
            )));
        }
        self.route_repo.insert(&route)?;
        info!(route_code = %route.route_code, "航线已录入");
        Ok(route)
    }

    /// 修改航线字段（基线标记与创建时间保持不变）
    #[instrument(skip(self, input))]
    pub fn update_route(&self, route_ref: &str, input: RouteInput) -> ApiResult<Route> {
        let existing = self.get_route(route_ref)?;
        let years = configured_year_range(self.config.as_ref())?;

        let mut route = input.into_route(existing.id.clone(), existing.created_at, Utc::now());
        route.is_baseline = existing.is_baseline;
        route
            .validate_within(years.min, years.max)
            .map_err(ApiError::ValidationError)?;

        if route.route_code != existing.route_code
            && self.route_repo.find_by_code(&route.route_code)?.is_some()
        {
            return Err(ApiError::ValidationError(format!(
                "航线编号已存在: {}",
                route.route_code
            )));
        }
        self.route_repo.update(&route)?;
        Ok(route)
    }
}
