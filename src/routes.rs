use std::sync::Arc;

use log::{debug, error};
use rocket::{
    catch,
    form::{Contextual, Form},
    get,
    http::{ContentType, Status},
    post,
    response::{Flash, Redirect},
    uri, State,
};
use rocket_dyn_templates::{context, Template};
use serde::Serialize;

use crate::{
    alert::Notifier,
    api::{self, FishApi},
    blobs::ObjectUrls,
    config::Config,
    form::{apply_partial, cut_off, EditForm, UploadError},
    image::image_src,
    models::FishRecord,
};

pub const LIST_FAILED: &str = "Nem sikerült lekérni a halakat!";
pub const SAVED: &str = "Sikeresen szerkesztve!";

type Api = Arc<dyn FishApi>;

/// A fish prepared for the templates.
#[derive(Debug, Serialize)]
struct FishView {
    id: i64,
    nev: String,
    faj: String,
    meret_cm: f64,
    to_id: i64,
    image: Option<String>,
}

impl FishView {
    fn new(fish: &FishRecord, image: Option<String>) -> Self {
        Self {
            id: fish.id,
            nev: fish.nev.clone(),
            faj: fish.faj.clone(),
            meret_cm: fish.meret_cm,
            to_id: fish.to_id,
            image,
        }
    }
}

fn fetch_failed(id: i64, err: &api::Error, notifier: &mut Notifier) -> (Status, &'static str) {
    error!("Could not fetch fish {id}: {err}");

    let message = err.message();
    notifier.danger(format!("Error: {message}"));

    let status = match err {
        api::Error::NotFound => Status::NotFound,
        _ => Status::BadGateway,
    };
    (status, message)
}

#[get("/")]
pub fn index() -> Redirect {
    Redirect::to(uri!(list))
}

#[get("/fish")]
pub async fn list(
    api: &State<Api>,
    urls: &State<ObjectUrls>,
    mut notifier: Notifier,
) -> (Status, Template) {
    debug!("GET /fish");

    match api.list().await {
        Ok(fishes) => {
            let mut blobs = urls.scope();
            let fishes: Vec<_> = fishes
                .iter()
                .map(|fish| FishView::new(fish, image_src(fish.kep.as_ref(), &mut blobs)))
                .collect();

            (
                Status::Ok,
                Template::render(
                    "list",
                    context! { alerts: notifier.alerts(), fishes: &fishes },
                ),
            )
        }
        Err(err) => {
            error!("Could not list fishes: {err}");
            notifier.danger(LIST_FAILED);

            (
                Status::BadGateway,
                Template::render(
                    "list",
                    context! {
                        alerts: notifier.alerts(),
                        fishes: Vec::<FishView>::new(),
                        error: LIST_FAILED,
                    },
                ),
            )
        }
    }
}

#[get("/fish/<id>")]
pub async fn detail(
    id: i64,
    api: &State<Api>,
    urls: &State<ObjectUrls>,
    mut notifier: Notifier,
) -> (Status, Template) {
    debug!("GET /fish/{id}");

    match api.get(id).await {
        Ok(fish) => {
            let fish = FishView::new(&fish, image_src(fish.kep.as_ref(), &mut urls.scope()));
            (
                Status::Ok,
                Template::render("detail", context! { alerts: notifier.alerts(), fish: &fish }),
            )
        }
        Err(err) => {
            let (status, message) = fetch_failed(id, &err, &mut notifier);
            (
                status,
                Template::render(
                    "detail",
                    context! { alerts: notifier.alerts(), error: message },
                ),
            )
        }
    }
}

fn edit_form(
    fish: &FishRecord,
    preview: Option<String>,
    config: &Config,
    notifier: &Notifier,
    error: Option<String>,
) -> Template {
    Template::render(
        "edit",
        context! {
            alerts: notifier.alerts(),
            id: fish.id,
            fish: FishView::new(fish, preview),
            max_image_size: config.max_image_size,
            error: error,
        },
    )
}

fn edit_error(id: i64, notifier: &Notifier, message: &str) -> Template {
    Template::render(
        "edit",
        context! { alerts: notifier.alerts(), id: id, error: message },
    )
}

#[get("/fish/<id>/edit")]
pub async fn edit(
    id: i64,
    api: &State<Api>,
    urls: &State<ObjectUrls>,
    config: &State<Config>,
    mut notifier: Notifier,
) -> (Status, Template) {
    debug!("GET /fish/{id}/edit");

    match api.get(id).await {
        Ok(fish) => {
            let preview = image_src(fish.kep.as_ref(), &mut urls.scope());
            (Status::Ok, edit_form(&fish, preview, config, &notifier, None))
        }
        Err(err) => {
            let (status, message) = fetch_failed(id, &err, &mut notifier);
            (status, edit_error(id, &notifier, message))
        }
    }
}

#[post("/fish/<id>/edit", data = "<form>")]
pub async fn update<'r>(
    id: i64,
    form: Form<Contextual<'r, EditForm<'r>>>,
    api: &State<Api>,
    urls: &State<ObjectUrls>,
    config: &State<Config>,
    mut notifier: Notifier,
) -> Result<Flash<Redirect>, (Status, Template)> {
    debug!("POST /fish/{id}/edit");

    let Contextual { value, context } = form.into_inner();

    // the fetched record carries everything the form does not edit
    let mut fish = match api.get(id).await {
        Ok(fish) => fish,
        Err(err) => {
            let (status, message) = fetch_failed(id, &err, &mut notifier);
            return Err((status, edit_error(id, &notifier, message)));
        }
    };
    let preview = image_src(fish.kep.as_ref(), &mut urls.scope());

    let Some(edits) = value else {
        apply_partial(&context, &mut fish);

        let status = if cut_off(&context) {
            debug!("Upload for fish {id} exceeded the request limits");
            notifier.danger(
                UploadError::TooLarge {
                    size: None,
                    limit: config.max_image_size,
                }
                .to_string(),
            );
            Status::PayloadTooLarge
        } else {
            let errors: Vec<_> = context.errors().map(ToString::to_string).collect();
            error!("Malformed edit of fish {id}: {}", errors.join(", "));
            notifier.danger(format!("Hiba a szerkesztés során: {}", errors.join(", ")));
            Status::UnprocessableEntity
        };
        return Err((status, edit_form(&fish, preview, config, &notifier, None)));
    };

    edits.apply(&mut fish);

    match edits.image(config.max_image_size).await {
        Ok(Some(kep)) => fish.kep = Some(kep),
        Ok(None) => {}
        Err(err) => {
            let status = match err {
                UploadError::TooLarge { size, .. } => {
                    debug!("Refusing {size:?} byte image for fish {id}");
                    Status::PayloadTooLarge
                }
                UploadError::NotAnImage => Status::UnsupportedMediaType,
                UploadError::Read(ref source) => {
                    error!("Could not read upload for fish {id}: {source}");
                    Status::InternalServerError
                }
            };
            notifier.danger(err.to_string());
            return Err((status, edit_form(&fish, preview, config, &notifier, None)));
        }
    }

    match api.update(id, &fish).await {
        Ok(_) => {
            notifier.success(SAVED);
            Ok(notifier.redirect(uri!(detail(id))))
        }
        Err(err) => {
            let message = err.detail();
            error!("Could not update fish {id}: {err}: {message}");
            notifier.danger(format!("Error: {message}"));

            Err((
                Status::BadGateway,
                edit_form(
                    &fish,
                    preview,
                    config,
                    &notifier,
                    Some(format!("Hiba a szerkesztés során: {message}")),
                ),
            ))
        }
    }
}

#[get("/blob/<key>")]
pub fn blob(key: &str, urls: &State<ObjectUrls>) -> Option<(ContentType, Vec<u8>)> {
    let blob = urls.get(key)?;
    let content_type = ContentType::parse_flexible(blob.content_type).unwrap_or(ContentType::Binary);

    Some((content_type, blob.bytes.clone()))
}

#[catch(404)]
pub fn not_found() -> Template {
    Template::render("error", context! { title: "Az oldal nem található" })
}

#[catch(500)]
pub fn internal_server_error() -> Template {
    Template::render("error", context! { title: "Váratlan hiba történt" })
}
