use serde::Deserialize;

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub header_image_url: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// -- Messages --

#[derive(Debug, Deserialize)]
pub struct NewMessageForm {
    pub text: String,
}
