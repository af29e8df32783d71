pub const USER_SESSION_COOKIE_NAME: &str = "user_session";

pub const HOME_URL: &str = "/";
pub const AUTH_URL: &str = "/auth";
pub const SIGN_IN_URL: &str = "/sign-in";
pub const SIGN_UP_URL: &str = "/sign-up";
pub const SIGN_OUT_URL: &str = "/sign-out";
pub const RESEND_VERIFICATION_URL: &str = "/resend-verification";
pub const DASHBOARD_URL: &str = "/dashboard";
pub const STUDENT_QUESTIONS_URL: &str = "/student/questions";
pub const TEACHER_QUESTIONS_URL: &str = "/teacher/questions";
pub const NEW_TEACHER_QUESTIONS_URL: &str = "/teacher/questions/new";
pub const EVENTS_URL: &str = "/events";

pub const SIGN_UP_TAB: &str = "signup";

pub fn sign_up_tab_url() -> String {
    format!("{AUTH_URL}?tab={SIGN_UP_TAB}")
}

pub fn answer_url(question_id: i32) -> String {
    format!("/teacher/questions/{question_id}/answer")
}

pub fn new_teacher_questions_url(after: i32) -> String {
    format!("{NEW_TEACHER_QUESTIONS_URL}?after={after}")
}
