#![allow(clippy::type_complexity)]

use std::time::Duration;

use bevy::{
    ecs::system::SystemState,
    input::common_conditions::input_just_pressed,
    math::{ivec2, uvec2},
    picking::pointer::PointerButton,
    prelude::*,
    utils::HashMap,
};

use crate::{prelude::*, state::GameState};

pub struct LifePlugin;

impl Plugin for LifePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Grid::new(GRID_COLS, GRID_ROWS))
            .insert_resource(Board::default())
            .insert_resource(Tints(vec![
                CellTint::Background;
                (GRID_COLS * GRID_ROWS) as usize
            ]))
            .insert_resource(Time::<Fixed>::from_duration(Duration::from_millis(
                UPDATE_INTERVAL_MS,
            )))
            .add_systems(
                OnEnter(GameState::Load),
                (load_meshes_and_materials, load_cell_board).chain(),
            )
            .add_systems(
                FixedUpdate,
                step_generation.run_if(in_state(GameState::Running)),
            )
            .add_systems(
                Update,
                (
                    randomize_grid.run_if(in_state(GameState::Paused)),
                    apply_tints.run_if(resource_changed::<Tints>),
                    toggle_paused_and_running.run_if(
                        input_just_pressed(KeyCode::Space)
                            .and(in_state(GameState::Running).or(in_state(GameState::Paused))),
                    ),
                ),
            );
    }
}

// ——> SYSTEMS

/// initialize meshes and materials in a resource
fn load_meshes_and_materials(
    world: &mut World,
    params: &mut SystemState<(
        ResMut<Assets<Mesh>>,
        ResMut<Assets<ColorMaterial>>,
        Res<Board>,
    )>,
) {
    // create material & mesh handles, and store them in the world
    let (mut meshes, mut materials, board) = params.get_mut(world);
    let cell_mesh = meshes.add(Rectangle::from_size(board.cell_size));
    let cell_dead_mat = materials.add(ColorMaterial::from_color(COLOR_BG));
    let cell_alive_mat = materials.add(ColorMaterial::from_color(COLOR_ALIVE_NEXT));
    let cell_dying_mat = materials.add(ColorMaterial::from_color(COLOR_WILL_DIE));

    let meshes = HashMap::from([("cell", cell_mesh)]);
    let materials = HashMap::from([
        ("cell_dead", cell_dead_mat),
        ("cell_alive", cell_alive_mat),
        ("cell_dying", cell_dying_mat),
    ]);
    // create an easily accessible resource for efficient reuse of materials and meshes
    world.insert_resource(MeshAndMats { meshes, materials });
}

/// spawn game of life board
fn load_cell_board(
    world: &mut World,
    params: &mut SystemState<(Res<MeshAndMats>, Res<Board>, ResMut<NextState<GameState>>)>,
) {
    let (meshes_and_mats, board, _) = params.get_mut(world);
    // copy the board so that we can use it later
    let board = *board;

    let cell_mesh = meshes_and_mats.meshes.get("cell").unwrap().to_owned();
    let dead_mat = meshes_and_mats
        .materials
        .get("cell_dead")
        .unwrap()
        .to_owned();

    let cell_count = (board.size.x * board.size.y) as usize;
    let cells_to_spawn = (0..cell_count)
        .map(|idx| board.idx_to_cell_coord(idx))
        .map(|cell_coord| {
            (
                Cell,
                Coord(cell_coord),
                Mesh2d(cell_mesh.clone()),
                MeshMaterial2d(dead_mat.clone()),
                Transform::from_translation(board.cell_coord_to_translation(cell_coord))
                    .with_scale(board.cell_scale.xyx()),
            )
        })
        .collect::<Vec<_>>();
    // spawn cells
    world.spawn_batch(cells_to_spawn);

    // add observers to support cell seeding with the left mouse button.
    //
    // pressing on a cell
    world.add_observer(cells_seed_on(|down: &Pointer<Down>| down.button));
    // dragging across cells while the button is held
    world.add_observer(cells_seed_on(|drag: &Pointer<DragOver>| drag.button));

    let (_, _, mut game_state) = params.get_mut(world);
    game_state.set(GameState::Paused);
}

/// Returns an observer that forces the cell under the pointer alive and refreshes
/// the board colors, without progressing the simulation.
fn cells_seed_on<E>(
    button_of: fn(&E) -> PointerButton,
) -> impl Fn(Trigger<E>, Query<&Coord, With<Cell>>, ResMut<Grid>, ResMut<Tints>) {
    move |trigger, query, mut grid, mut tints| {
        if button_of(trigger.event()) != PointerButton::Primary {
            return;
        }
        if let Ok(coord) = query.get(trigger.entity()) {
            grid.set_alive(**coord);
            // static redraw: the computed next generation is not applied
            tints.0 = grid.advance(false).1;
        }
    }
}

fn randomize_grid(
    keyboard_input: Res<ButtonInput<KeyCode>>,
    mut grid: ResMut<Grid>,
    mut tints: ResMut<Tints>,
) {
    if keyboard_input.just_pressed(KeyCode::KeyR) {
        grid.randomize();
        tints.0 = grid.advance(false).1;
    }
}

fn toggle_paused_and_running(
    state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
    grid: Res<Grid>,
    mut tints: ResMut<Tints>,
) {
    match state.get() {
        GameState::Paused => next_state.set(GameState::Running),
        GameState::Running => next_state.set(GameState::Paused),
        _ => unreachable!(),
    }
    // redraw with plain current-state colors; the returned grid is discarded
    tints.0 = grid.advance(false).1;
}

fn step_generation(mut grid: ResMut<Grid>, mut tints: ResMut<Tints>) {
    let (next, colors) = grid.advance(true);
    *grid = next;
    tints.0 = colors;
}

fn apply_tints(
    tints: Res<Tints>,
    board: Res<Board>,
    mesh_n_mats: Res<MeshAndMats>,
    mut cell_query: Query<(&Coord, &mut MeshMaterial2d<ColorMaterial>), With<Cell>>,
) {
    for (coord, mut material) in cell_query.iter_mut() {
        let key = match tints.0[board.cell_coord_to_idx(**coord)] {
            CellTint::Background => "cell_dead",
            CellTint::AliveNext => "cell_alive",
            CellTint::WillDie => "cell_dying",
        };
        **material = mesh_n_mats.materials.get(key).unwrap().to_owned();
    }
}

// ——> COMPONENTS

#[derive(Component)]
#[require(Mesh2d)]
struct Cell;

/// grid position of a cell entity, (x, y) = (col, row)
#[derive(Component, Debug, Clone, Copy, Deref)]
struct Coord(UVec2);

// ——> RESOURCES

/// hold handles for meshes and materials
#[derive(Resource, Clone)]
struct MeshAndMats {
    meshes: HashMap<&'static str, Handle<Mesh>>,
    materials: HashMap<&'static str, Handle<ColorMaterial>>,
}

/// per-cell display colors for the current frame
#[derive(Resource, Debug)]
struct Tints(Vec<CellTint>);

/// Display color of a single cell for one frame. `WillDie` and the newborn
/// reading of `AliveNext` only appear when the simulation is progressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellTint {
    Background,
    WillDie,
    AliveNext,
}

/// The cell states of one generation. `advance` never mutates in place, it
/// returns a replacement grid so neighbor counting always reads a single
/// consistent generation.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    /// the amount of cells on each axis, (x, y) = (cols, rows)
    size: UVec2,
    /// row-major, idx = y * cols + x
    cells: Vec<bool>,
}

impl Grid {
    pub fn new(cols: u32, rows: u32) -> Self {
        Self {
            size: uvec2(cols, rows),
            cells: vec![false; (cols * rows) as usize],
        }
    }

    #[inline]
    fn idx(&self, coord: UVec2) -> usize {
        (coord.y * self.size.x + coord.x) as usize
    }

    pub fn is_alive(&self, coord: UVec2) -> bool {
        self.cells[self.idx(coord)]
    }

    pub fn set_alive(&mut self, coord: UVec2) {
        let idx = self.idx(coord);
        self.cells[idx] = true;
    }

    pub fn randomize(&mut self) {
        for cell in &mut self.cells {
            *cell = fastrand::bool();
        }
    }

    /// count alive cells in the 8-neighborhood; cells past the edges are dead
    /// (finite board, no wraparound)
    fn live_neighbours(&self, coord: UVec2) -> u8 {
        let mut count = 0;
        for pos_offs in (-1..=1)
            .flat_map(|y| (-1..=1).map(move |x| ivec2(x, y)))
            // filter out if pos_offs is (0, 0)
            .filter(|pos_offs| !(pos_offs.x == 0 && pos_offs.y == 0))
        {
            let pos = coord.as_ivec2() + pos_offs;
            if pos.x < 0
                || pos.y < 0
                || pos.x >= self.size.x as i32
                || pos.y >= self.size.y as i32
            {
                continue;
            }
            if self.cells[self.idx(pos.as_uvec2())] {
                count += 1;
            }
        }
        count
    }

    /// Compute the next generation along with one display color per cell.
    ///
    /// With `with_hints` the colors encode the upcoming transition: an alive
    /// cell about to die reads `WillDie`, a dead cell about to be born reads
    /// `AliveNext`. Without hints the colors reflect only the current state,
    /// for redraws that do not progress the simulation. The next generation is
    /// computed either way; the caller decides whether to apply it.
    pub fn advance(&self, with_hints: bool) -> (Grid, Vec<CellTint>) {
        let mut next = Grid::new(self.size.x, self.size.y);
        let mut tints = Vec::with_capacity(self.cells.len());

        for y in 0..self.size.y {
            for x in 0..self.size.x {
                let coord = uvec2(x, y);
                let idx = self.idx(coord);
                let alive = self.cells[idx];
                let nval = self.live_neighbours(coord);

                let alive_next = if alive {
                    (2..=3).contains(&nval)
                } else {
                    nval == 3
                };
                next.cells[idx] = alive_next;

                let tint = if alive {
                    if with_hints && !alive_next {
                        CellTint::WillDie
                    } else {
                        CellTint::AliveNext
                    }
                } else if with_hints && alive_next {
                    CellTint::AliveNext
                } else {
                    CellTint::Background
                };
                tints.push(tint);
            }
        }

        (next, tints)
    }
}

#[derive(Resource, Clone, Copy)]
pub struct Board {
    /// the center of the board
    center: Vec2,
    /// the amount of cells on each axis, (x, y) = (cols, rows)
    size: UVec2,
    /// the size of each individual cell
    cell_size: Vec2,
    /// scale of each individual cell (should be 0.0 - 1.0)
    cell_scale: Vec2,
}

impl Board {
    /// computes full size of the board in pixels
    #[inline]
    fn pixel_size(&self) -> Vec2 {
        self.size.as_vec2() * self.cell_size
    }

    #[inline]
    fn cell_coord_to_translation(&self, cell_coord: UVec2) -> Vec3 {
        (self.center - (self.pixel_size() * 0.5)
            + cell_coord.as_vec2() * self.cell_size
            + self.cell_size * 0.5)
            .extend(10.0)
    }

    #[inline]
    fn cell_coord_to_idx(&self, cell_coord: UVec2) -> usize {
        (cell_coord.y * self.size.x + cell_coord.x) as usize
    }

    #[inline]
    fn idx_to_cell_coord(&self, idx: usize) -> UVec2 {
        uvec2(idx as u32 % self.size.x, idx as u32 / self.size.x)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self {
            center: BOARD_POS,
            size: uvec2(GRID_COLS, GRID_ROWS),
            cell_size: CELL_SIZE_PX,
            cell_scale: CELL_SCALE,
        }
    }
}

#[cfg(test)]
mod test {
    use bevy::math::{vec2, vec3};

    use super::*;

    /// builds a grid from (row, col) pairs
    fn grid_with(cols: u32, rows: u32, alive: &[(u32, u32)]) -> Grid {
        let mut grid = Grid::new(cols, rows);
        for &(row, col) in alive {
            grid.set_alive(uvec2(col, row));
        }
        grid
    }

    /// alive cells as (row, col) pairs in row-major order
    fn alive_cells(grid: &Grid) -> Vec<(u32, u32)> {
        let mut alive = Vec::new();
        for y in 0..grid.size.y {
            for x in 0..grid.size.x {
                if grid.is_alive(uvec2(x, y)) {
                    alive.push((y, x));
                }
            }
        }
        alive
    }

    #[test]
    fn all_dead_is_a_fixed_point() {
        let grid = Grid::new(10, 10);
        let (next, tints) = grid.advance(true);
        assert_eq!(grid, next);
        assert!(tints.iter().all(|&t| t == CellTint::Background));
    }

    #[test]
    fn survival_and_death_rules() {
        // plus shape: the center has 4 neighbours, the arms have 3
        let grid = grid_with(7, 7, &[(2, 3), (3, 2), (3, 3), (3, 4), (4, 3)]);
        let (next, _) = grid.advance(true);
        // overpopulated center dies
        assert!(!next.is_alive(uvec2(3, 3)));
        // arms survive with 3 neighbours
        assert!(next.is_alive(uvec2(3, 2)));
        assert!(next.is_alive(uvec2(2, 3)));
        assert!(next.is_alive(uvec2(4, 3)));
        assert!(next.is_alive(uvec2(3, 4)));

        // a lone pair is underpopulated, both die
        let grid = grid_with(7, 7, &[(3, 3), (3, 4)]);
        let (next, _) = grid.advance(true);
        assert!(alive_cells(&next).is_empty());
    }

    #[test]
    fn birth_rule_completes_a_block() {
        // L-tromino: the empty corner has exactly 3 neighbours and is born
        let grid = grid_with(8, 8, &[(2, 2), (2, 3), (3, 2)]);
        let (next, _) = grid.advance(true);
        assert_eq!(vec![(2, 2), (2, 3), (3, 2), (3, 3)], alive_cells(&next));
    }

    #[test]
    fn blinker_oscillates() {
        let grid = grid_with(10, 10, &[(5, 4), (5, 5), (5, 6)]);
        let (next, _) = grid.advance(true);
        assert_eq!(vec![(4, 5), (5, 5), (6, 5)], alive_cells(&next));
        // and back again
        let (next, _) = next.advance(true);
        assert_eq!(vec![(5, 4), (5, 5), (5, 6)], alive_cells(&next));
    }

    #[test]
    fn block_is_a_still_life() {
        let block = vec![(5, 5), (5, 6), (6, 5), (6, 6)];
        let mut grid = grid_with(10, 10, &block);
        for _ in 0..5 {
            grid = grid.advance(true).0;
            assert_eq!(block, alive_cells(&grid));
        }
    }

    #[test]
    fn glider_translates_diagonally() {
        let glider = [(1, 2), (2, 3), (3, 1), (3, 2), (3, 3)];
        let mut grid = grid_with(12, 12, &glider);
        for _ in 0..4 {
            grid = grid.advance(true).0;
        }
        // every 4 generations the glider moves one cell down-right
        let moved: Vec<_> = glider.iter().map(|&(r, c)| (r + 1, c + 1)).collect();
        assert_eq!(moved, alive_cells(&grid));
    }

    #[test]
    fn corner_cell_dies_without_wraparound() {
        // with toroidal edges a far-corner neighbour could keep it company;
        // on the finite board a lone corner cell has zero neighbours
        let grid = grid_with(5, 5, &[(0, 0)]);
        let (next, tints) = grid.advance(true);
        assert!(alive_cells(&next).is_empty());
        assert_eq!(CellTint::WillDie, tints[0]);
    }

    #[test]
    fn hints_encode_upcoming_transitions() {
        let grid = grid_with(10, 10, &[(5, 4), (5, 5), (5, 6)]);
        let idx = |row: u32, col: u32| (row * 10 + col) as usize;

        let (_, tints) = grid.advance(true);
        // the blinker's ends die, the center survives
        assert_eq!(CellTint::WillDie, tints[idx(5, 4)]);
        assert_eq!(CellTint::AliveNext, tints[idx(5, 5)]);
        assert_eq!(CellTint::WillDie, tints[idx(5, 6)]);
        // the cells above and below the center are born
        assert_eq!(CellTint::AliveNext, tints[idx(4, 5)]);
        assert_eq!(CellTint::AliveNext, tints[idx(6, 5)]);
    }

    #[test]
    fn static_redraw_reflects_current_state_only() {
        let grid = grid_with(10, 10, &[(5, 4), (5, 5), (5, 6)]);
        let idx = |row: u32, col: u32| (row * 10 + col) as usize;

        let (next, tints) = grid.advance(false);
        // alive cells all read alive, dying or not; unborn cells stay background
        assert_eq!(CellTint::AliveNext, tints[idx(5, 4)]);
        assert_eq!(CellTint::AliveNext, tints[idx(5, 5)]);
        assert_eq!(CellTint::AliveNext, tints[idx(5, 6)]);
        assert_eq!(CellTint::Background, tints[idx(4, 5)]);

        // the rule is unconditional on the flag: the next generation matches
        // the one a progressing call computes, and the receiver is untouched
        assert_eq!(next, grid.advance(true).0);
        assert_eq!(vec![(5, 4), (5, 5), (5, 6)], alive_cells(&grid));
    }

    #[test]
    fn board_works() {
        let board = Board {
            center: Vec2::ZERO,
            cell_size: Vec2::splat(8.0),
            cell_scale: Vec2::splat(0.9),
            size: uvec2(8, 4),
        };

        let px_size = board.pixel_size();
        assert_eq!(vec2(64., 32.), px_size);

        assert_eq!(9, board.cell_coord_to_idx(uvec2(1, 1)));
        assert_eq!(uvec2(7, 3), board.idx_to_cell_coord(31));
        assert_eq!(
            uvec2(3, 2),
            board.idx_to_cell_coord(board.cell_coord_to_idx(uvec2(3, 2)))
        );
        assert_eq!(
            vec3(-4.0, 12.0, 10.),
            board.cell_coord_to_translation(uvec2(3, 3))
        );
    }
}
