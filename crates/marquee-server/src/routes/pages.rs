use axum::extract::State;
use axum::response::Html;
use axum::Json;
use marquee_core::DashboardStats;
use crate::error::ApiResult;
use crate::state::AppState;

const LOGIN_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Admin sign-in</title></head>
<body>
<form id="request"><input name="email" type="email" placeholder="Admin email" required><button>Send OTP</button></form>
<form id="verify"><input name="otp" inputmode="numeric" maxlength="6" placeholder="6-digit code" required><button>Verify</button></form>
<p id="status"></p>
<script>
const status = document.getElementById("status");
let email = "";
async function post(path, body) {
  const res = await fetch(path, { method: "POST", headers: { "content-type": "application/json" }, body: JSON.stringify(body) });
  return res.json();
}
document.getElementById("request").onsubmit = async (e) => {
  e.preventDefault();
  email = e.target.email.value;
  const out = await post("/api/send-otp", { email });
  status.textContent = out.success ? "OTP sent" : out.error;
};
document.getElementById("verify").onsubmit = async (e) => {
  e.preventDefault();
  const out = await post("/api/verify-otp", { email, otp: e.target.otp.value });
  if (out.success) location.href = "/admin"; else status.textContent = out.error;
};
</script>
</body>
</html>
"#;

pub async fn login() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

/// Landing page of the admin area; the gate has already checked the session
pub async fn admin_home(State(state): State<AppState>) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(marquee_core::dashboard(state.services.store.as_ref()).await?))
}
