//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{activity, auth, borrows, equipment, health, repairs, stats, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "EquipTrack API",
        version = "1.0.0",
        description = "Equipment Borrow & Repair Tracking REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html"),
        contact(name = "EquipTrack Team", email = "contact@equiptrack.org")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Equipment
        equipment::list_equipment,
        equipment::list_equipment_types,
        equipment::get_equipment,
        equipment::create_equipment,
        equipment::import_equipment,
        equipment::update_equipment,
        equipment::delete_equipment,
        // Borrows
        borrows::list_borrows,
        borrows::get_borrow,
        borrows::get_user_borrows,
        borrows::create_borrow,
        borrows::approve_borrow,
        borrows::reject_borrow,
        borrows::assess_delivery,
        borrows::return_borrow,
        borrows::assess_return,
        // Repairs
        repairs::list_repairs,
        repairs::get_repair,
        repairs::approve_repair,
        repairs::reject_repair,
        repairs::complete_repair,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        // Activity
        activity::list_activity,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserInfo,
            // Equipment
            crate::models::equipment::Equipment,
            crate::models::equipment::CreateEquipment,
            crate::models::equipment::UpdateEquipment,
            crate::models::equipment::EquipmentQuery,
            crate::models::equipment::EquipmentTypeSummary,
            crate::models::enums::EquipmentStatus,
            // Borrows
            crate::models::borrow::BorrowRequest,
            crate::models::borrow::BorrowLine,
            crate::models::borrow::BorrowAssignment,
            crate::models::borrow::BorrowReturnedItem,
            crate::models::borrow::BorrowDetails,
            crate::models::borrow::CreateBorrowRequest,
            crate::models::borrow::CreateBorrowLine,
            crate::models::borrow::BorrowQuery,
            crate::models::enums::BorrowStatus,
            borrows::RejectBorrowRequest,
            // Assessments
            crate::models::assessment::Assessment,
            crate::models::assessment::ChecklistItem,
            crate::models::assessment::DeliveryAssessmentRequest,
            crate::models::assessment::ReturnAssessmentRequest,
            crate::models::enums::AssessmentStage,
            crate::models::enums::AssessmentOutcome,
            crate::models::enums::ItemCondition,
            // Repairs
            crate::models::repair::RepairRequest,
            crate::models::repair::CompleteRepairRequest,
            crate::models::repair::RepairQuery,
            crate::models::enums::RepairStatus,
            repairs::RejectRepairRequest,
            // Users
            crate::models::user::User,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            crate::models::user::UserQuery,
            crate::models::user::Role,
            crate::models::user::UserStatus,
            // Activity
            crate::models::activity::ActivityEntry,
            crate::models::activity::ActivityQuery,
            crate::models::activity::ActivityAction,
            // Stats
            stats::StatsResponse,
            stats::EquipmentStats,
            stats::BorrowStats,
            stats::RepairStats,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "equipment", description = "Equipment inventory management"),
        (name = "borrows", description = "Borrow request lifecycle"),
        (name = "repairs", description = "Repair request management"),
        (name = "users", description = "User management"),
        (name = "activity", description = "Audit trail"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
