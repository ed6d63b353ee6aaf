use mealview_mealplan::{MealPlan, MealPlanView, RecipeImages, ViewState};

/// Main region of the meal plan page. Loading wins over error, error over
/// the grid, and the empty message only shows for a loaded empty list.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    Loading,
    Error(String),
    Grid(Vec<Card>),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub id: String,
    pub title: Option<String>,
    pub image_url: String,
    pub ingredients: Vec<String>,
    pub description: Option<String>,
    pub prep_time: Option<String>,
    pub nutrition_info: Option<String>,
    pub cuisine_type: Option<String>,
    pub meal_type: Option<String>,
    pub rating: Option<String>,
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

impl Card {
    pub fn new(plan: &MealPlan, images: &RecipeImages) -> Self {
        let recipe = plan.recipe.as_ref();

        Self {
            id: plan.meal_plan_id.to_owned(),
            title: non_empty(recipe.and_then(|r| r.title.as_ref())),
            description: non_empty(recipe.and_then(|r| r.description.as_ref())),
            image_url: images.url(recipe),
        }
    }
}

impl Region {
    pub fn new(view: &MealPlanView, images: &RecipeImages) -> Self {
        match view.state() {
            ViewState::Loading => Region::Loading,
            ViewState::Error(message) => Region::Error(message.to_owned()),
            ViewState::Loaded(plans) if plans.is_empty() => Region::Empty,
            ViewState::Loaded(plans) => {
                Region::Grid(plans.iter().map(|p| Card::new(p, images)).collect())
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Region::Loading)
    }
}

impl Overlay {
    /// Present, and therefore shown, only while a selection exists.
    pub fn new(view: &MealPlanView, images: &RecipeImages) -> Option<Self> {
        let plan = view.selected()?;
        let recipe = plan.recipe.as_ref();

        Some(Self {
            id: plan.meal_plan_id.to_owned(),
            title: non_empty(recipe.and_then(|r| r.title.as_ref())),
            image_url: images.url(recipe),
            ingredients: recipe
                .map(|r| r.ingredients.iter().cloned().collect())
                .unwrap_or_default(),
            description: non_empty(recipe.and_then(|r| r.description.as_ref())),
            prep_time: non_empty(recipe.and_then(|r| r.prep_time.as_ref())),
            nutrition_info: non_empty(recipe.and_then(|r| r.nutrition_info.as_ref())),
            cuisine_type: non_empty(recipe.and_then(|r| r.cuisine_type.as_ref())),
            meal_type: non_empty(recipe.and_then(|r| r.meal_type.as_ref())),
            rating: non_empty(recipe.and_then(|r| r.ratings_average.as_ref())),
        })
    }
}
