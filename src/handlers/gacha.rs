use crate::error::AppError;
use crate::middlewares::CurrentUser;
use crate::models::*;
use crate::services::GachaService;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

/// 内部接口密钥请求头
pub const INTERNAL_KEY_HEADER: &str = "X-Internal-Key";

/// 从请求扩展中获取用户ID（中间件在鉴权后注入）
fn get_user_id_from_request(req: &HttpRequest) -> Result<i64, AppError> {
    req.extensions()
        .get::<CurrentUser>()
        .map(|user| user.0)
        .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))
}

#[utoipa::path(
    get,
    path = "/api/v1/gacha/tickets",
    tag = "gacha",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取抽奖券余额成功", body = TicketBalanceResponse),
        (status = 401, description = "未授权")
    )
)]
/// 获取当前抽奖券余额
pub async fn get_tickets(
    service: web::Data<GachaService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match get_user_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.get_ticket_balance(user_id).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/gacha/daily",
    tag = "gacha",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取每日免费抽状态成功", body = DailyDrawStatusResponse),
        (status = 401, description = "未授权")
    )
)]
/// 今天是否还能免费抽（按 UTC 日期）
pub async fn get_daily_status(
    service: web::Data<GachaService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match get_user_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.can_draw_daily_today(user_id).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/gacha/pity",
    tag = "gacha",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取保底计数成功", body = PityCountersResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_pity(service: web::Data<GachaService>, req: HttpRequest) -> Result<HttpResponse> {
    let user_id = match get_user_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.get_pity_counters(user_id).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/gacha/history",
    tag = "gacha",
    params(
        ("limit" = Option<u64>, Query, description = "返回条数 (默认20, 最大100)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取抽取历史成功", body = [DrawHistoryEntryResponse]),
        (status = 401, description = "未授权")
    )
)]
/// 抽取历史（倒序）
pub async fn get_history(
    service: web::Data<GachaService>,
    req: HttpRequest,
    query: web::Query<DrawHistoryQuery>,
) -> Result<HttpResponse> {
    let user_id = match get_user_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.get_draw_history(user_id, query.limit).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/gacha/collection",
    tag = "gacha",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取已拥有徽章成功", body = [OwnedBadgeResponse]),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_collection(
    service: web::Data<GachaService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match get_user_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.list_collection(user_id).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/gacha/badges",
    tag = "gacha",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取徽章目录成功", body = [BadgeResponse])
    )
)]
pub async fn get_badges(service: web::Data<GachaService>) -> Result<HttpResponse> {
    let list = service.list_badges();
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list })))
}

#[utoipa::path(
    get,
    path = "/api/v1/gacha/rates",
    tag = "gacha",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取公示概率成功", body = GachaRatesResponse)
    )
)]
pub async fn get_rates(service: web::Data<GachaService>) -> Result<HttpResponse> {
    let rates = service.rates();
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": rates })))
}

#[utoipa::path(
    post,
    path = "/api/v1/gacha/draw",
    tag = "gacha",
    request_body = DrawRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "抽取成功", body = DrawResponse),
        (status = 409, description = "今天已免费抽过 / 抽奖券不足"),
        (status = 401, description = "未授权"),
        (status = 500, description = "徽章目录配置错误")
    )
)]
/// 进行一次抽取:
/// 1. daily 校验今天未抽过；ticket 扣减 1 张券
/// 2. 按保底计数决定稀有度，再在该稀有度中等概率选徽章
/// 3. 未拥有则发放，已拥有则只记录
/// 4. 更新保底计数并写入历史
pub async fn draw(
    service: web::Data<GachaService>,
    req: HttpRequest,
    body: web::Json<DrawRequest>,
) -> Result<HttpResponse> {
    let user_id = match get_user_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.draw(user_id, body.kind).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/internal/gacha/tickets",
    tag = "gacha_internal",
    request_body = AddTicketsRequest,
    params(
        ("X-Internal-Key" = String, Header, description = "内部接口密钥")
    ),
    responses(
        (status = 200, description = "发放抽奖券成功", body = AddTicketsResponse),
        (status = 400, description = "数量必须大于0"),
        (status = 403, description = "内部密钥错误或接口未启用")
    )
)]
/// 发放抽奖券，供发帖奖励等其它业务调用
pub async fn add_tickets(
    service: web::Data<GachaService>,
    req: HttpRequest,
    body: web::Json<AddTicketsRequest>,
) -> Result<HttpResponse> {
    let expected = service.settings().internal_api_key.as_str();
    let provided = req
        .headers()
        .get(INTERNAL_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    if expected.is_empty() || provided != Some(expected) {
        return Ok(AppError::Forbidden.error_response());
    }

    let body = body.into_inner();
    match service.add_tickets(body.user_id, body.amount).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置（挂在 /api/v1 下，需要登录）
pub fn gacha_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/gacha")
            .route("/tickets", web::get().to(get_tickets))
            .route("/daily", web::get().to(get_daily_status))
            .route("/pity", web::get().to(get_pity))
            .route("/history", web::get().to(get_history))
            .route("/collection", web::get().to(get_collection))
            .route("/badges", web::get().to(get_badges))
            .route("/rates", web::get().to(get_rates))
            .route("/draw", web::post().to(draw)),
    );
}

/// 内部路由（不经过 JWT，接口内校验内部密钥）
pub fn gacha_internal_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/internal/gacha").route("/tickets", web::post().to(add_tickets)),
    );
}
